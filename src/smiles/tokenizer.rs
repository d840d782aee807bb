use crate::bond::{BondDirection, BondOrder};
use crate::input::AtomRecord;
use crate::smiles::error::SmilesError;

/// Element symbols accepted inside brackets.
const ELEMENTS: &str = "H He Li Be B C N O F Ne Na Mg Al Si P S Cl Ar K Ca Sc Ti V Cr Mn Fe Co Ni \
    Cu Zn Ga Ge As Se Br Kr Rb Sr Y Zr Nb Mo Tc Ru Rh Pd Ag Cd In Sn Sb Te I Xe Cs Ba La Ce Pr Nd \
    Pm Sm Eu Gd Tb Dy Ho Er Tm Yb Lu Hf Ta W Re Os Ir Pt Au Hg Tl Pb Bi Po At Rn Fr Ra Ac Th Pa U \
    Np Pu Am Cm Bk Cf Es Fm Md No Lr Rf Db Sg Bh Hs Mt Ds Rg Cn Nh Fl Mc Lv Ts Og";

/// Lowercase symbols allowed inside brackets. Two-letter ones come first.
const AROMATIC_IN_BRACKETS: [&str; 9] = ["se", "te", "as", "b", "c", "n", "o", "p", "s"];

fn is_element(symbol: &str) -> bool {
    ELEMENTS.split_whitespace().any(|e| e == symbol)
}

/// A bond symbol: its order plus the `/` `\` marker, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondSymbol {
    pub order: BondOrder,
    pub direction: Option<BondDirection>,
}

impl BondSymbol {
    fn plain(order: BondOrder) -> Self {
        Self {
            order,
            direction: None,
        }
    }

    fn directional(direction: BondDirection) -> Self {
        Self {
            order: BondOrder::Single,
            direction: Some(direction),
        }
    }

    pub fn text(self) -> char {
        match (self.direction, self.order) {
            (Some(BondDirection::Up), _) => '/',
            (Some(BondDirection::Down), _) => '\\',
            (None, BondOrder::Single) => '-',
            (None, BondOrder::Double) => '=',
            (None, BondOrder::Triple) => '#',
            (None, BondOrder::Quadruple) => '$',
            (None, BondOrder::Aromatic) => ':',
        }
    }

    /// Two symbols may close the same ring when they agree, or when both
    /// only carry a direction.
    pub fn compatible(self, other: BondSymbol) -> bool {
        self == other || (self.direction.is_some() && other.direction.is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Atom { record: AtomRecord, pos: usize },
    Bond { symbol: BondSymbol, pos: usize },
    Ring { digit: u16, pos: usize },
    Open(usize),
    Close(usize),
    Dot(usize),
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars().enumerate().all(|(k, c)| self.peek_at(k) == Some(c))
    }

    fn digit(&mut self) -> Option<u32> {
        let d = self.peek()?.to_digit(10)?;
        self.pos += 1;
        Some(d)
    }

    /// Unsigned number, or `None` when no digit follows.
    fn number(&mut self, bracket: usize) -> Result<Option<u16>, SmilesError> {
        let mut value: Option<u16> = None;
        while let Some(d) = self.digit() {
            value = Some(
                value
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(d as u16))
                    .ok_or(SmilesError::InvalidIsotope { pos: bracket })?,
            );
        }
        Ok(value)
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    let mut cursor = Cursor {
        chars: input.chars().collect(),
        pos: 0,
    };
    let mut tokens = Vec::new();

    while let Some(c) = cursor.peek() {
        let pos = cursor.pos;
        let token = match c {
            ' ' | '\t' | '\r' | '\n' => {
                cursor.bump();
                continue;
            }
            '[' => Token::Atom {
                record: bracket_atom(&mut cursor)?,
                pos,
            },
            'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I' | '*' => {
                cursor.bump();
                let element = match (c, cursor.peek()) {
                    ('B', Some('r')) | ('C', Some('l')) => {
                        cursor.bump();
                        format!("{c}{}", if c == 'B' { 'r' } else { 'l' })
                    }
                    _ => c.to_string(),
                };
                Token::Atom {
                    record: AtomRecord::new(&element),
                    pos,
                }
            }
            'b' | 'c' | 'n' | 'o' | 'p' | 's' => {
                cursor.bump();
                let mut record = AtomRecord::new(&c.to_ascii_uppercase().to_string());
                record.is_aromatic = true;
                Token::Atom { record, pos }
            }
            '-' | '=' | '#' | '$' | ':' | '/' | '\\' => {
                cursor.bump();
                let symbol = match c {
                    '-' => BondSymbol::plain(BondOrder::Single),
                    '=' => BondSymbol::plain(BondOrder::Double),
                    '#' => BondSymbol::plain(BondOrder::Triple),
                    '$' => BondSymbol::plain(BondOrder::Quadruple),
                    ':' => BondSymbol::plain(BondOrder::Aromatic),
                    '/' => BondSymbol::directional(BondDirection::Up),
                    _ => BondSymbol::directional(BondDirection::Down),
                };
                Token::Bond { symbol, pos }
            }
            '(' => {
                cursor.bump();
                Token::Open(pos)
            }
            ')' => {
                cursor.bump();
                Token::Close(pos)
            }
            '.' => {
                cursor.bump();
                Token::Dot(pos)
            }
            '%' => {
                cursor.bump();
                match (cursor.digit(), cursor.digit()) {
                    (Some(a), Some(b)) => Token::Ring {
                        digit: (a * 10 + b) as u16,
                        pos,
                    },
                    _ => return Err(SmilesError::UnexpectedChar { pos, ch: '%' }),
                }
            }
            '0'..='9' => Token::Ring {
                digit: cursor.digit().unwrap_or_default() as u16,
                pos,
            },
            ch => return Err(SmilesError::UnexpectedChar { pos, ch }),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// `[` isotope? symbol chirality? hcount? charge? class? `]`
fn bracket_atom(cursor: &mut Cursor) -> Result<AtomRecord, SmilesError> {
    let start = cursor.pos;
    cursor.bump();

    let isotope = cursor.number(start)?.unwrap_or(0);
    let mut record = bracket_element(cursor, start)?;
    record.isotope = isotope;
    skip_chirality(cursor);
    record.hydrogen_count = Some(if cursor.eat('H') {
        cursor.digit().map_or(1, |d| d as u8)
    } else {
        0
    });
    record.charge = charge(cursor, start)?;
    // atom class
    if cursor.eat(':') {
        while cursor.digit().is_some() {}
    }

    if !cursor.eat(']') {
        return Err(SmilesError::UnclosedBracket { pos: start });
    }
    Ok(record)
}

fn bracket_element(cursor: &mut Cursor, start: usize) -> Result<AtomRecord, SmilesError> {
    let Some(first) = cursor.peek() else {
        return Err(SmilesError::UnclosedBracket { pos: start });
    };
    if cursor.eat('*') {
        return Ok(AtomRecord::new("*"));
    }

    for pattern in AROMATIC_IN_BRACKETS {
        if !cursor.starts_with(pattern) {
            continue;
        }
        let followed_by_lower = cursor
            .peek_at(pattern.len())
            .is_some_and(|c| c.is_ascii_lowercase());
        if pattern.len() == 2 || !followed_by_lower {
            cursor.pos += pattern.len();
            let mut symbol = pattern.to_string();
            symbol[..1].make_ascii_uppercase();
            let mut record = AtomRecord::new(&symbol);
            record.is_aromatic = true;
            return Ok(record);
        }
    }

    if first.is_ascii_uppercase() {
        if let Some(second) = cursor.peek_at(1).filter(|c| c.is_ascii_lowercase()) {
            let symbol = format!("{first}{second}");
            if is_element(&symbol) {
                cursor.pos += 2;
                return Ok(AtomRecord::new(&symbol));
            }
        }
        let symbol = first.to_string();
        if is_element(&symbol) {
            cursor.pos += 1;
            return Ok(AtomRecord::new(&symbol));
        }
    }

    Err(SmilesError::InvalidElement {
        pos: cursor.pos,
        text: first.to_string(),
    })
}

/// Chirality marks carry nothing the layout uses.
fn skip_chirality(cursor: &mut Cursor) {
    while cursor.eat('@') {}
    // @TH1, @AL2, @SP3, @TB10, @OH25
    for class in ["TH", "AL", "SP", "TB", "OH"] {
        if cursor.starts_with(class) {
            cursor.pos += 2;
            while cursor.digit().is_some() {}
            return;
        }
    }
}

fn charge(cursor: &mut Cursor, start: usize) -> Result<i8, SmilesError> {
    let sign = match cursor.peek() {
        Some(c @ ('+' | '-')) => c,
        _ => return Ok(0),
    };
    cursor.bump();
    let unit: i8 = if sign == '+' { 1 } else { -1 };

    let mut repeats: i8 = 1;
    while cursor.eat(sign) {
        repeats = repeats
            .checked_add(1)
            .ok_or(SmilesError::InvalidCharge { pos: start })?;
    }
    if repeats > 1 {
        return Ok(unit * repeats);
    }

    let mut magnitude: Option<i8> = None;
    while let Some(d) = cursor.digit() {
        magnitude = Some(
            magnitude
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(d as i8))
                .ok_or(SmilesError::InvalidCharge { pos: start })?,
        );
    }
    Ok(unit * magnitude.unwrap_or(1))
}
