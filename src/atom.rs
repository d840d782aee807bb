use crate::rings::RingId;

/// The chemical payload of a graph vertex.
///
/// `Atom` stores what the line notation said about the atom plus the ring
/// bookkeeping written by ring perception. It deliberately omits computed
/// properties like valence or implicit hydrogens; the layout engine never
/// needs them.
///
/// # Examples
///
/// ```
/// use crabdraw::Atom;
///
/// let nitrogen = Atom {
///     charge: 1,
///     hydrogen_count: Some(4),
///     ..Atom::new("N")
/// };
/// assert_eq!(nitrogen.element, "N");
/// assert!(nitrogen.rings.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol as written, capitalised (`"C"`, `"Cl"`, `"Se"`).
    pub element: String,
    /// Formal charge in elementary charge units.
    pub charge: i8,
    /// Mass number. `0` means natural isotopic abundance (the common case).
    pub isotope: u16,
    /// Hydrogen count from a bracket atom (`[NH4+]` gives `Some(4)`).
    ///
    /// `None` for organic-subset atoms written without brackets.
    pub hydrogen_count: Option<u8>,
    /// Whether the atom was written in aromatic (lowercase) form.
    pub is_aromatic: bool,
    /// Hidden atoms take no part in overlap scoring.
    pub is_drawn: bool,
    /// Active rings this atom belongs to. Rewritten by ring perception and
    /// bridged-ring consolidation.
    pub rings: Vec<RingId>,
    /// The bridged ring system this atom was merged into, if any.
    pub bridged_ring: Option<RingId>,
}

impl Atom {
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            charge: 0,
            isotope: 0,
            hydrogen_count: None,
            is_aromatic: false,
            is_drawn: true,
            rings: Vec::new(),
            bridged_ring: None,
        }
    }

    pub fn is_carbon(&self) -> bool {
        self.element == "C"
    }

    pub fn is_in_ring(&self) -> bool {
        !self.rings.is_empty()
    }

    /// Forget all ring membership. Called before ring perception reruns.
    pub fn clear_rings(&mut self) {
        self.rings.clear();
        self.bridged_ring = None;
    }
}

impl Default for Atom {
    fn default() -> Self {
        Self::new("C")
    }
}
