use std::{iter::Peekable, str::CharIndices};

use super::{element, Atom, BondOrder, Chiral, SmilesError};

#[derive(Clone, Debug, PartialEq)]
pub(super) enum Token {
    // punctuation
    LParen,
    RParen,
    Dot,
    // an organic subset atom or a whole bracket atom
    Atom(Atom),
    Bond(BondOrder),
    // ring closure label, either a single digit or %nn
    Ring(usize),
    // end
    End,
}

impl Token {
    /// whether this is the sentinel that follows the last real token
    pub(super) fn is_end(&self) -> bool {
        *self == Token::End
    }
}

type Chars<'a> = Peekable<CharIndices<'a>>;

fn get_digits(chars: &mut Chars<'_>) -> String {
    let mut digits = String::new();
    while let Some((_, c)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
        digits.push(c);
    }
    digits
}

fn next_is(chars: &mut Chars<'_>, want: char) -> bool {
    chars.next_if(|&(_, c)| c == want).is_some()
}

/// Split `s` into tokens tagged with the byte offset they start at. The
/// SMILES ends at the first whitespace, anything after it is a name or
/// comment.
pub(super) fn scan(s: &str) -> Result<Vec<(usize, Token)>, SmilesError> {
    use Token as T;
    let mut chars = s.char_indices().peekable();
    let mut ret = Vec::new();
    let mut end = s.len();
    while let Some((pos, c)) = chars.next() {
        let got = match c {
            '(' => T::LParen,
            ')' => T::RParen,
            '.' => T::Dot,
            '-' => T::Bond(BondOrder::Single),
            '=' => T::Bond(BondOrder::Double),
            '#' => T::Bond(BondOrder::Triple),
            '$' => T::Bond(BondOrder::Quadruple),
            ':' => T::Bond(BondOrder::Aromatic),
            '/' => T::Bond(BondOrder::Up),
            '\\' => T::Bond(BondOrder::Down),
            '0'..='9' => T::Ring(c as usize - '0' as usize),
            '%' => {
                let mut label = String::new();
                for _ in 0..2 {
                    match chars.next_if(|(_, c)| c.is_ascii_digit()) {
                        Some((_, d)) => label.push(d),
                        None => {
                            return Err(SmilesError::UnexpectedChar {
                                ch: '%',
                                pos,
                            })
                        }
                    }
                }
                T::Ring(label.parse().map_err(|_| {
                    SmilesError::UnexpectedChar { ch: '%', pos }
                })?)
            }
            '[' => T::Atom(bracket_atom(&mut chars, pos)?),
            '*' => T::Atom(Atom::organic(0, false)),
            'B' if next_is(&mut chars, 'r') => T::Atom(Atom::organic(35, false)),
            'C' if next_is(&mut chars, 'l') => T::Atom(Atom::organic(17, false)),
            'B' => T::Atom(Atom::organic(5, false)),
            'C' => T::Atom(Atom::organic(6, false)),
            'N' => T::Atom(Atom::organic(7, false)),
            'O' => T::Atom(Atom::organic(8, false)),
            'F' => T::Atom(Atom::organic(9, false)),
            'P' => T::Atom(Atom::organic(15, false)),
            'S' => T::Atom(Atom::organic(16, false)),
            'I' => T::Atom(Atom::organic(53, false)),
            'b' => T::Atom(Atom::organic(5, true)),
            'c' => T::Atom(Atom::organic(6, true)),
            'n' => T::Atom(Atom::organic(7, true)),
            'o' => T::Atom(Atom::organic(8, true)),
            'p' => T::Atom(Atom::organic(15, true)),
            's' => T::Atom(Atom::organic(16, true)),
            c if c.is_whitespace() => {
                end = pos;
                break;
            }
            ch => return Err(SmilesError::UnexpectedChar { ch, pos }),
        };
        ret.push((pos, got));
    }
    ret.push((end, T::End));
    Ok(ret)
}

/// Consume everything up to the closing `]` and parse it as
///
/// isotope? symbol chiral? hcount? charge? class?
fn bracket_atom(chars: &mut Chars<'_>, start: usize) -> Result<Atom, SmilesError> {
    let mut body = String::new();
    let mut closed = false;
    for (_, c) in chars.by_ref() {
        if c == ']' {
            closed = true;
            break;
        }
        body.push(c);
    }
    if !closed {
        return Err(SmilesError::UnterminatedBracket(start));
    }
    let invalid = |reason: String| SmilesError::InvalidBracket {
        pos: start,
        reason,
    };
    if body.is_empty() {
        return Err(invalid("empty brackets".to_owned()));
    }

    let mut chars = body.char_indices().peekable();
    let isotope = Some(get_digits(&mut chars))
        .filter(|d| !d.is_empty())
        .map(|d| d.parse().map_err(|_| invalid(format!("bad isotope {d}"))))
        .transpose()?;

    let (atomic_number, aromatic) = bracket_symbol(&mut chars, start)?;

    let mut chiral = Chiral::None;
    if next_is(&mut chars, '@') {
        chiral = if next_is(&mut chars, '@') {
            Chiral::Clockwise
        } else {
            let mut class = String::new();
            if let Some((_, c)) =
                chars.next_if(|&(_, c)| matches!(c, 'T' | 'A' | 'S' | 'O'))
            {
                class.push(c);
                if let Some((_, c)) =
                    chars.next_if(|(_, c)| c.is_ascii_uppercase())
                {
                    class.push(c);
                }
            }
            if class.is_empty() {
                Chiral::Anticlockwise
            } else {
                let n = get_digits(&mut chars);
                if !matches!(class.as_str(), "TH" | "AL" | "SP" | "TB" | "OH")
                    || n.is_empty()
                {
                    return Err(invalid(format!("bad chirality @{class}{n}")));
                }
                Chiral::Other(format!("@{class}{n}"))
            }
        };
    }

    let mut n_hydrogens: usize = 0;
    if next_is(&mut chars, 'H') {
        let digits = get_digits(&mut chars);
        n_hydrogens = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| invalid(format!("bad hydrogen count {digits}")))?
        };
    }

    let mut charge = 0;
    if let Some((_, sign)) = chars.next_if(|&(_, c)| matches!(c, '+' | '-')) {
        let unit = if sign == '+' { 1 } else { -1 };
        let digits = get_digits(&mut chars);
        let magnitude = if digits.is_empty() {
            let mut n = 1;
            while next_is(&mut chars, sign) {
                n += 1;
            }
            n
        } else {
            digits
                .parse::<isize>()
                .map_err(|_| invalid(format!("bad charge {digits}")))?
        };
        charge = unit * magnitude;
    }

    let mut class = None;
    if next_is(&mut chars, ':') {
        let digits = get_digits(&mut chars);
        class = Some(
            digits
                .parse()
                .map_err(|_| invalid("missing atom class".to_owned()))?,
        );
    }

    if let Some((_, c)) = chars.next() {
        return Err(invalid(format!("unexpected '{c}'")));
    }

    Ok(Atom {
        atomic_number,
        aromatic,
        isotope,
        charge,
        n_hydrogens: Some(n_hydrogens),
        chiral,
        class,
    })
}

fn bracket_symbol(
    chars: &mut Chars<'_>,
    start: usize,
) -> Result<(usize, bool), SmilesError> {
    let unknown = |symbol: String| SmilesError::UnknownElement {
        symbol,
        pos: start,
    };
    let Some((_, c)) = chars.next() else {
        return Err(SmilesError::InvalidBracket {
            pos: start,
            reason: "missing element symbol".to_owned(),
        });
    };
    match c {
        '*' => Ok((0, false)),
        's' if next_is(chars, 'e') => Ok((34, true)),
        'a' if next_is(chars, 's') => Ok((33, true)),
        't' if next_is(chars, 'e') => Ok((52, true)),
        'b' => Ok((5, true)),
        'c' => Ok((6, true)),
        'n' => Ok((7, true)),
        'o' => Ok((8, true)),
        'p' => Ok((15, true)),
        's' => Ok((16, true)),
        c if c.is_ascii_uppercase() => {
            if let Some(&(_, l)) = chars.peek() {
                if l.is_ascii_lowercase() {
                    let two = format!("{c}{l}");
                    if let Some(n) = element::atomic_number(&two) {
                        chars.next();
                        return Ok((n, false));
                    }
                }
            }
            element::atomic_number(&c.to_string())
                .map(|n| (n, false))
                .ok_or_else(|| unknown(c.to_string()))
        }
        c => Err(unknown(c.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(s: &str) -> Vec<Atom> {
        scan(s)
            .unwrap()
            .into_iter()
            .filter_map(|(_, t)| match t {
                Token::Atom(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn simple_scan() {
        let got: Vec<_> = scan("C=C(Cl)Br").unwrap().into_iter().map(|(_, t)| t).collect();
        use Token as T;
        let want = vec![
            T::Atom(Atom::organic(6, false)),
            T::Bond(BondOrder::Double),
            T::Atom(Atom::organic(6, false)),
            T::LParen,
            T::Atom(Atom::organic(17, false)),
            T::RParen,
            T::Atom(Atom::organic(35, false)),
            T::End,
        ];
        assert_eq!(got, want);
    }

    #[test]
    fn ring_labels() {
        let got: Vec<_> = scan("C%12CC%12")
            .unwrap()
            .into_iter()
            .filter_map(|(_, t)| match t {
                Token::Ring(n) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(got, vec![12, 12]);
        assert!(scan("C%1").is_err());
    }

    #[test]
    fn bracket_atoms() {
        let got = atoms("[13C@@H3][nH][O-2][Fe+++][N+:7][Sc][se]");
        assert_eq!(got[0].isotope, Some(13));
        assert_eq!(got[0].atomic_number, 6);
        assert_eq!(got[0].n_hydrogens, Some(3));
        assert_eq!(got[0].chiral, Chiral::Clockwise);

        assert!(got[1].aromatic);
        assert_eq!(got[1].n_hydrogens, Some(1));

        assert_eq!(got[2].charge, -2);
        assert_eq!(got[3].atomic_number, 26);
        assert_eq!(got[3].charge, 3);
        assert_eq!(got[4].class, Some(7));
        assert_eq!(got[4].n_hydrogens, Some(0));
        assert_eq!(got[5].atomic_number, 21);
        assert_eq!(got[6].atomic_number, 34);
        assert!(got[6].aromatic);
    }

    #[test]
    fn extended_chirality() {
        let got = atoms("[C@TH2]");
        assert_eq!(got[0].chiral, Chiral::Other("@TH2".to_owned()));
        assert!(scan("[C@XY1]").is_err());
    }

    #[test]
    fn stops_at_whitespace() {
        let got = scan("CC ethane").unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(got[2], (2, Token::End));
    }

    #[test]
    fn scan_errors() {
        assert_eq!(
            scan("invalid!!"),
            Err(SmilesError::UnexpectedChar { ch: 'i', pos: 0 })
        );
        assert_eq!(scan("C[CH3"), Err(SmilesError::UnterminatedBracket(1)));
        assert!(matches!(
            scan("[Xy]"),
            Err(SmilesError::UnknownElement { .. })
        ));
        assert!(matches!(
            scan("[]"),
            Err(SmilesError::InvalidBracket { .. })
        ));
        assert!(matches!(
            scan("[C+a]"),
            Err(SmilesError::InvalidBracket { .. })
        ));
    }

    #[test]
    fn hydrogen_counts() {
        let got = atoms("[CH][CH4][NH0]");
        let hs: Vec<_> = got.iter().map(|a| a.n_hydrogens).collect();
        assert_eq!(hs, vec![Some(1), Some(4), Some(0)]);

        let err = scan("[CH99999999999999999999999999]").unwrap_err();
        assert_eq!(
            err,
            SmilesError::InvalidBracket {
                pos: 0,
                reason: "bad hydrogen count 99999999999999999999999999".to_owned(),
            }
        );
    }
}
