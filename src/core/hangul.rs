//! Hangul Initial Sound Law
//!
//! Some syllables may be played under an alternative initial consonant
//! (e.g. 리 as 이, 라 as 나). The resolver accepts either form of the
//! required node.

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const MEDIAL_COUNT: u32 = 21;
const FINAL_COUNT: u32 = 28;

const INITIAL_NIEUN: u32 = 2;
const INITIAL_RIEUL: u32 = 5;
const INITIAL_IEUNG: u32 = 11;

// Medial indices: ㅏ0 ㅐ1 ㅑ2 ㅕ6 ㅖ7 ㅗ8 ㅚ11 ㅛ12 ㅜ13 ㅠ17 ㅡ18 ㅣ20
const RIEUL_TO_NIEUN: [u32; 6] = [0, 1, 8, 11, 13, 18];
const RIEUL_TO_IEUNG: [u32; 6] = [2, 6, 7, 12, 17, 20];
const NIEUN_TO_IEUNG: [u32; 4] = [6, 12, 17, 20];

/// Decomposed precomposed syllable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syllable {
    pub initial: u32,
    pub medial: u32,
    pub final_: u32,
}

impl Syllable {
    pub fn split(ch: char) -> Option<Self> {
        let code = ch as u32;
        if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&code) {
            return None;
        }
        let offset = code - SYLLABLE_BASE;
        Some(Self {
            initial: offset / (MEDIAL_COUNT * FINAL_COUNT),
            medial: (offset / FINAL_COUNT) % MEDIAL_COUNT,
            final_: offset % FINAL_COUNT,
        })
    }

    pub fn merge(self) -> Option<char> {
        let code = SYLLABLE_BASE + (self.initial * MEDIAL_COUNT + self.medial) * FINAL_COUNT + self.final_;
        char::from_u32(code)
    }
}

/// Alternative syllable under the initial sound law, if any.
pub fn apply_initial_law(ch: char) -> Option<char> {
    let mut syllable = Syllable::split(ch)?;
    syllable.initial = match syllable.initial {
        INITIAL_RIEUL if RIEUL_TO_NIEUN.contains(&syllable.medial) => INITIAL_NIEUN,
        INITIAL_RIEUL if RIEUL_TO_IEUNG.contains(&syllable.medial) => INITIAL_IEUNG,
        INITIAL_NIEUN if NIEUN_TO_IEUNG.contains(&syllable.medial) => INITIAL_IEUNG,
        _ => return None,
    };
    syllable.merge()
}

/// Substitute node for `node`: the first syllable rewritten, the rest kept.
pub fn initial_law_node(node: &str) -> Option<String> {
    let mut chars = node.chars();
    let first = apply_initial_law(chars.next()?)?;
    let mut out = String::with_capacity(node.len());
    out.push(first);
    out.extend(chars);
    Some(out)
}
