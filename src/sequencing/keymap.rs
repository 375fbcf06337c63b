//! QWERTY-to-pitch mapping for the virtual piano.
//!
//! Three octaves on desktop (C3..B5), two on compact layouts (C4..B5).
//! Each row of the keyboard covers one octave of white keys with the row
//! above it supplying the black keys, mirroring how hardware "musical
//! typing" modes lay keys out.

use super::notes::NoteName;

/// Which physical rows are available for note entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardLayout {
    /// Full three-octave mapping, C3..B5.
    Desktop,
    /// Two-octave mapping, C4..B5, for narrow keyboards.
    Compact,
}

// (key, midi offset from C of the row's octave)
// White keys land on 0 2 4 5 7 9 11; black keys on 1 3 6 8 10.
const LOW_ROW: [(char, u8); 12] = [
    ('z', 0),
    ('s', 1),
    ('x', 2),
    ('d', 3),
    ('c', 4),
    ('v', 5),
    ('g', 6),
    ('b', 7),
    ('h', 8),
    ('n', 9),
    ('j', 10),
    ('m', 11),
];

const MID_ROW: [(char, u8); 12] = [
    ('q', 0),
    ('2', 1),
    ('w', 2),
    ('3', 3),
    ('e', 4),
    ('r', 5),
    ('5', 6),
    ('t', 7),
    ('6', 8),
    ('y', 9),
    ('7', 10),
    ('u', 11),
];

const HIGH_ROW: [(char, u8); 12] = [
    ('i', 0),
    ('9', 1),
    ('o', 2),
    ('0', 3),
    ('p', 4),
    ('[', 5),
    ('=', 6),
    (']', 7),
    ('\\', 8),
    (';', 9),
    ('\'', 10),
    ('l', 11),
];

/// Map a typed character to the note it plays, or `None` for non-note keys.
pub fn note_for_key(key: char, layout: KeyboardLayout) -> Option<NoteName> {
    let key = key.to_ascii_lowercase();

    let rows: &[(&[(char, u8)], u8)] = match layout {
        // MIDI 48 = C3, 60 = C4, 72 = C5
        KeyboardLayout::Desktop => &[(&LOW_ROW, 48), (&MID_ROW, 60), (&HIGH_ROW, 72)],
        KeyboardLayout::Compact => &[(&MID_ROW, 60), (&HIGH_ROW, 72)],
    };

    for (row, base_midi) in rows {
        if let Some((_, offset)) = row.iter().find(|(k, _)| *k == key) {
            return Some(NoteName::from_midi(base_midi + offset));
        }
    }
    None
}

/// The full pitch range a layout covers, inclusive, as MIDI numbers.
pub fn layout_range(layout: KeyboardLayout) -> (u8, u8) {
    match layout {
        KeyboardLayout::Desktop => (48, 83), // C3..B5
        KeyboardLayout::Compact => (60, 83), // C4..B5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_is_c3_on_desktop() {
        let note = note_for_key('z', KeyboardLayout::Desktop).unwrap();
        assert_eq!(note.to_string(), "C3");
        assert_eq!(note.midi(), 48);
    }

    #[test]
    fn q_is_c4_everywhere() {
        for layout in [KeyboardLayout::Desktop, KeyboardLayout::Compact] {
            let note = note_for_key('q', layout).unwrap();
            assert_eq!(note.midi(), 60, "layout {layout:?}");
        }
    }

    #[test]
    fn compact_layout_omits_low_octave() {
        assert!(note_for_key('z', KeyboardLayout::Compact).is_none());
        assert!(note_for_key('m', KeyboardLayout::Compact).is_none());
    }

    #[test]
    fn black_keys_sit_between_whites() {
        let s = note_for_key('s', KeyboardLayout::Desktop).unwrap();
        assert_eq!(s.to_string(), "C#3");
        assert!(s.class.is_accidental());

        let seven = note_for_key('7', KeyboardLayout::Desktop).unwrap();
        assert_eq!(seven.to_string(), "A#4");
    }

    #[test]
    fn upper_row_reaches_b5() {
        let l = note_for_key('l', KeyboardLayout::Desktop).unwrap();
        assert_eq!(l.to_string(), "B5");
        assert_eq!(l.midi(), 83);
    }

    #[test]
    fn uppercase_maps_like_lowercase() {
        assert_eq!(
            note_for_key('Q', KeyboardLayout::Desktop),
            note_for_key('q', KeyboardLayout::Desktop)
        );
    }

    #[test]
    fn unmapped_keys_return_none() {
        assert!(note_for_key('1', KeyboardLayout::Desktop).is_none());
        assert!(note_for_key(' ', KeyboardLayout::Desktop).is_none());
    }
}
