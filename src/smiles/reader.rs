use std::collections::BTreeMap;

use crate::bond::BondOrder;
use crate::input::{BondRecord, MoleculeInput};
use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::{BondSymbol, Token};

struct OpenRing {
    atom: usize,
    symbol: Option<BondSymbol>,
}

#[derive(Default)]
struct Reader {
    input: MoleculeInput,
    current: Option<usize>,
    /// Branch points with the position of their `(`.
    branches: Vec<(usize, usize)>,
    pending: Option<BondSymbol>,
    open_rings: BTreeMap<u16, OpenRing>,
}

/// Turn a token stream into atom and bond records in parse order.
pub fn read(tokens: &[Token]) -> Result<MoleculeInput, SmilesError> {
    let mut reader = Reader::default();
    for token in tokens {
        reader.token(token)?;
    }
    reader.finish()
}

impl Reader {
    fn token(&mut self, token: &Token) -> Result<(), SmilesError> {
        match token {
            Token::Atom { record, .. } => {
                let idx = self.input.atoms.len();
                self.input.atoms.push(record.clone());
                if let Some(previous) = self.current {
                    let symbol = self.pending.take();
                    self.bond(previous, idx, symbol, false);
                }
                self.current = Some(idx);
            }
            &Token::Bond { symbol, pos } => {
                if self.current.is_none() || self.pending.is_some() {
                    return Err(SmilesError::UnexpectedChar {
                        pos,
                        ch: symbol.text(),
                    });
                }
                self.pending = Some(symbol);
            }
            &Token::Ring { digit, pos } => {
                let here = self
                    .current
                    .ok_or(SmilesError::InvalidRingBond { digit, pos })?;
                let symbol = self.pending.take();
                match self.open_rings.remove(&digit) {
                    None => {
                        self.open_rings.insert(digit, OpenRing { atom: here, symbol });
                    }
                    Some(open) if open.atom == here => {
                        return Err(SmilesError::InvalidRingBond { digit, pos });
                    }
                    Some(open) => {
                        // the side that carries the symbol is the bond's source
                        let (source, target, symbol) = match (open.symbol, symbol) {
                            (Some(a), Some(b)) if !a.compatible(b) => {
                                return Err(SmilesError::RingBondConflict { digit });
                            }
                            (Some(a), _) => (open.atom, here, Some(a)),
                            (None, Some(b)) => (here, open.atom, Some(b)),
                            (None, None) => (open.atom, here, None),
                        };
                        self.bond(source, target, symbol, true);
                    }
                }
            }
            &Token::Open(pos) => {
                let atom = self.current.ok_or(SmilesError::UnmatchedParen { pos })?;
                self.branches.push((atom, pos));
            }
            &Token::Close(pos) => {
                if self.pending.is_some() {
                    return Err(SmilesError::UnexpectedChar { pos, ch: ')' });
                }
                let (atom, _) = self.branches.pop().ok_or(SmilesError::UnmatchedParen { pos })?;
                self.current = Some(atom);
            }
            &Token::Dot(pos) => {
                if self.pending.is_some() {
                    return Err(SmilesError::UnexpectedChar { pos, ch: '.' });
                }
                self.current = None;
            }
        }
        Ok(())
    }

    fn bond(&mut self, source: usize, target: usize, symbol: Option<BondSymbol>, is_ring_closure: bool) {
        let order = match symbol {
            Some(s) => s.order,
            None if self.input.atoms[source].is_aromatic && self.input.atoms[target].is_aromatic => {
                BondOrder::Aromatic
            }
            None => BondOrder::Single,
        };
        let mut record = BondRecord::new(source, target, order);
        record.direction = symbol.and_then(|s| s.direction);
        record.is_ring_closure = is_ring_closure;
        self.input.bonds.push(record);
    }

    fn finish(self) -> Result<MoleculeInput, SmilesError> {
        if self.pending.is_some() {
            return Err(SmilesError::UnexpectedEnd);
        }
        if let Some(&(_, pos)) = self.branches.last() {
            return Err(SmilesError::UnmatchedParen { pos });
        }
        if let Some(&digit) = self.open_rings.keys().next() {
            return Err(SmilesError::UnclosedRing { digit });
        }
        Ok(self.input)
    }
}
