use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

/// Directional single-bond marker from the line notation (`/` and `\`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondDirection {
    /// `/`
    Up,
    /// `\`
    Down,
}

impl BondDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CisTrans {
    Cis,
    Trans,
}

impl CisTrans {
    pub fn flipped(self) -> Self {
        match self {
            Self::Cis => Self::Trans,
            Self::Trans => Self::Cis,
        }
    }
}

/// Wedge hint for the renderer. Assigned outside the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wedge {
    Solid,
    Hashed,
}

/// Cis/trans relation between substituents on the two ends of a double bond.
///
/// Keys are `(anchor bonded to the source atom, anchor bonded to the target
/// atom)`. Lookups accept either order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CisTransTable {
    entries: BTreeMap<(NodeIndex, NodeIndex), CisTrans>,
}

impl CisTransTable {
    pub fn insert(&mut self, source_anchor: NodeIndex, target_anchor: NodeIndex, rel: CisTrans) {
        self.entries.insert((source_anchor, target_anchor), rel);
    }

    pub fn get(&self, a: NodeIndex, b: NodeIndex) -> Option<CisTrans> {
        self.entries
            .get(&(a, b))
            .or_else(|| self.entries.get(&(b, a)))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, CisTrans)> + '_ {
        self.entries.iter().map(|(&(a, b), &rel)| (a, b, rel))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A bond between two vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub order: BondOrder,
    pub direction: Option<BondDirection>,
    pub cis_trans: CisTransTable,
    pub wedge: Option<Wedge>,
}

impl Edge {
    pub fn new(source: NodeIndex, target: NodeIndex, order: BondOrder) -> Self {
        Self {
            source,
            target,
            order,
            direction: None,
            cis_trans: CisTransTable::default(),
            wedge: None,
        }
    }

    pub fn other(&self, id: NodeIndex) -> Option<NodeIndex> {
        if id == self.source {
            Some(self.target)
        } else if id == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn has_cis_trans(&self) -> bool {
        self.order == BondOrder::Double && !self.cis_trans.is_empty()
    }

    /// Drop directional markers, the cis/trans table and any wedge.
    pub fn clear_stereo(&mut self) {
        self.direction = None;
        self.cis_trans.clear();
        self.wedge = None;
    }

    /// Replace an aromatic order by a plain single bond.
    pub fn clear_aromatic(&mut self) {
        if self.order == BondOrder::Aromatic {
            self.order = BondOrder::Single;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn table_lookup_either_order() {
        let mut table = CisTransTable::default();
        table.insert(n(0), n(3), CisTrans::Trans);
        assert_eq!(table.get(n(0), n(3)), Some(CisTrans::Trans));
        assert_eq!(table.get(n(3), n(0)), Some(CisTrans::Trans));
        assert_eq!(table.get(n(0), n(4)), None);
    }

    #[test]
    fn clear_stereo_empties_table() {
        let mut edge = Edge::new(n(1), n(2), BondOrder::Double);
        edge.cis_trans.insert(n(0), n(3), CisTrans::Cis);
        edge.wedge = Some(Wedge::Solid);
        assert!(edge.has_cis_trans());
        edge.clear_stereo();
        assert!(!edge.has_cis_trans());
        assert_eq!(edge.wedge, None);
    }

    #[test]
    fn clear_aromatic_only_touches_aromatic() {
        let mut edge = Edge::new(n(0), n(1), BondOrder::Aromatic);
        edge.clear_aromatic();
        assert_eq!(edge.order, BondOrder::Single);
        let mut double = Edge::new(n(0), n(1), BondOrder::Double);
        double.clear_aromatic();
        assert_eq!(double.order, BondOrder::Double);
    }

    #[test]
    fn other_endpoint() {
        let edge = Edge::new(n(4), n(7), BondOrder::Single);
        assert_eq!(edge.other(n(4)), Some(n(7)));
        assert_eq!(edge.other(n(7)), Some(n(4)));
        assert_eq!(edge.other(n(5)), None);
    }
}
