//! In-memory model of a parsed SNG file.
//!
//! Field order within each struct matches the on-disk record order; see
//! [`crate::parser`] for the wire layout.

use enumflags2::{BitFlags, bitflags};

/// Technique flags attached to notes, chords, and per-string chord notes.
#[bitflags]
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoteMask {
    Chord = 0x0000_0002,
    Open = 0x0000_0004,
    FretHandMute = 0x0000_0008,
    Tremolo = 0x0000_0010,
    Harmonic = 0x0000_0020,
    PalmMute = 0x0000_0040,
    Slap = 0x0000_0080,
    Pluck = 0x0000_0100,
    HammerOn = 0x0000_0200,
    PullOff = 0x0000_0400,
    Slide = 0x0000_0800,
    Bend = 0x0000_1000,
    Sustain = 0x0000_2000,
    Tap = 0x0000_4000,
    PinchHarmonic = 0x0000_8000,
    Vibrato = 0x0001_0000,
    Mute = 0x0002_0000,
    Ignore = 0x0004_0000,
    LeftHand = 0x0008_0000,
    RightHand = 0x0010_0000,
    HighDensity = 0x0020_0000,
    SlideUnpitchedTo = 0x0040_0000,
    Single = 0x0080_0000,
    ChordNotes = 0x0100_0000,
    DoubleStop = 0x0200_0000,
    Accent = 0x0400_0000,
    Parent = 0x0800_0000,
    Child = 0x1000_0000,
    Arpeggio = 0x2000_0000,
    ChordPanel = 0x8000_0000,
}

/// One point on a bend curve.
#[derive(Debug, Clone, Copy, Default)]
pub struct BendValue {
    pub time: f32,
    pub step: f32,
    pub unk1: i16,
    pub unk2: u8,
    pub unk3: u8,
}

/// One beat marker. `mask & 0x01` marks the start of a measure.
#[derive(Debug, Clone, Default)]
pub struct Beat {
    pub time: f32,
    pub measure: i16,
    pub beat: i16,
    pub phrase_iteration: i32,
    pub mask: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Phrase {
    pub solo: u8,
    pub disparity: u8,
    pub ignore: u8,
    pub padding: u8,
    pub max_difficulty: i32,
    pub phrase_iteration_links: i32,
    pub name: String,
}

/// A chord shape. Frets and fingers use `-1` for unused strings; the raw
/// mask value selects the display-name suffix (1 = arpeggio, 2 = nop).
#[derive(Debug, Clone, Default)]
pub struct ChordTemplate {
    pub mask: u32,
    pub frets: [i8; 6],
    pub fingers: [i8; 6],
    pub notes: [i32; 6],
    pub name: String,
}

/// Per-string technique data referenced by chord notes.
#[derive(Debug, Clone, Default)]
pub struct ChordNotes {
    pub mask: [BitFlags<NoteMask>; 6],
    pub bend_data: [Vec<BendValue>; 6],
    pub slide_to: [Option<u8>; 6],
    pub slide_unpitch_to: [Option<u8>; 6],
    pub vibrato: [i16; 6],
}

#[derive(Debug, Clone, Default)]
pub struct Vocal {
    pub time: f32,
    pub note: i32,
    pub length: f32,
    pub lyric: String,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolsHeader {
    pub unk: [i32; 8],
}

#[derive(Debug, Clone, Default)]
pub struct SymbolsTexture {
    pub font_name: String,
    pub font_path_length: i32,
    pub unk: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolDefinition {
    pub text: String,
    pub rect_outer: [f32; 4],
    pub rect_inner: [f32; 4],
}

#[derive(Debug, Clone, Default)]
pub struct PhraseIteration {
    pub phrase_id: i32,
    pub start_time: f32,
    pub next_phrase_time: f32,
    pub difficulty: [i32; 3],
}

#[derive(Debug, Clone, Default)]
pub struct PhraseExtraInfo {
    pub phrase_id: i32,
    pub difficulty: i32,
    pub empty: i32,
    pub level_jump: u8,
    pub redundant: i16,
    pub padding: u8,
}

#[derive(Debug, Clone, Default)]
pub struct NLinkedDifficulty {
    pub level_break: i32,
    pub nld_phrases: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct Action {
    pub time: f32,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Event {
    pub time: f32,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Tone {
    pub time: f32,
    pub tone_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Dna {
    pub time: f32,
    pub dna_id: i32,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub number: i32,
    pub start_time: f32,
    pub end_time: f32,
    pub start_phrase_iteration_index: i32,
    pub end_phrase_iteration_index: i32,
    pub string_bytes: [u8; 36],
}

impl Default for Section {
    fn default() -> Self {
        Self {
            name: String::new(),
            number: 0,
            start_time: 0.0,
            end_time: 0.0,
            start_phrase_iteration_index: 0,
            end_phrase_iteration_index: 0,
            string_bytes: [0; 36],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Anchor {
    pub start_time: f32,
    pub end_time: f32,
    pub unk1: f32,
    pub unk2: f32,
    pub fret: i32,
    pub width: i32,
    pub phrase_iteration_index: i32,
}

#[derive(Debug, Clone, Default)]
pub struct AnchorExtension {
    pub beat_time: f32,
    pub fret_id: u8,
    pub unk2: i32,
    pub unk3: i16,
    pub unk4: u8,
}

/// A span during which a chord shape is held. Handshape and arpeggio
/// fingerprints share this layout and differ only in which array they
/// arrive in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprint {
    pub chord_id: i32,
    pub start_time: f32,
    pub end_time: f32,
    pub unk1: f32,
    pub unk2: f32,
}

/// One played note or chord reference within an arrangement.
///
/// `slide_to`, `slide_unpitch_to`, and `left_hand` arrive as raw bytes where
/// `0xFF` means absent; they are surfaced as `None` so the emitter can omit
/// the attribute.
#[derive(Debug, Clone, Default)]
pub struct Note {
    pub mask: BitFlags<NoteMask>,
    pub flags: u32,
    pub hash: u32,
    pub time: f32,
    pub string: i8,
    pub fret: i8,
    pub anchor_fret: i8,
    pub anchor_width: i8,
    pub chord_id: i32,
    pub chord_notes_id: i32,
    pub phrase_id: i32,
    pub phrase_iteration_id: i32,
    pub fingerprint_id: [i16; 2],
    pub next_iteration: i16,
    pub prev_iteration: i16,
    pub parent_prev_note: i16,
    pub slide_to: Option<u8>,
    pub slide_unpitch_to: Option<u8>,
    pub left_hand: Option<u8>,
    pub tap: i8,
    pub pick_direction: i8,
    pub slap: i8,
    pub pluck: i8,
    pub vibrato: i16,
    pub sustain: f32,
    pub max_bend: f32,
    pub bend_values: Vec<BendValue>,
}

/// One difficulty level of the song.
#[derive(Debug, Clone, Default)]
pub struct Arrangement {
    pub difficulty: i32,
    pub anchors: Vec<Anchor>,
    pub anchor_extensions: Vec<AnchorExtension>,
    pub fingerprints_handshape: Vec<Fingerprint>,
    pub fingerprints_arpeggio: Vec<Fingerprint>,
    pub notes: Vec<Note>,
    pub average_notes_per_iteration: Vec<f32>,
    pub notes_in_iteration1: Vec<i32>,
    pub notes_in_iteration2: Vec<i32>,
}

/// Song-level trailer; always the final section of the stream.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub max_score: f64,
    pub max_notes_and_chords: f64,
    pub max_notes_and_chords_real: f64,
    pub point_per_note: f64,
    pub first_beat_length: f32,
    pub start_time: f32,
    pub capo_fret_id: i8,
    pub last_conversion_date_time: String,
    pub part: i16,
    pub song_length: f32,
    pub tuning: Vec<i16>,
    pub first_note_time: f32,
    pub first_note_time2: f32,
    pub max_difficulty: i32,
}

/// Everything a single SNG file contains.
///
/// The three symbol sections are populated only for vocal-type files; their
/// presence in the stream is keyed on `vocals` being non-empty.
#[derive(Debug, Clone, Default)]
pub struct SongData {
    pub beats: Vec<Beat>,
    pub phrases: Vec<Phrase>,
    pub chords: Vec<ChordTemplate>,
    pub chord_notes: Vec<ChordNotes>,
    pub vocals: Vec<Vocal>,
    pub symbols_headers: Vec<SymbolsHeader>,
    pub symbols_textures: Vec<SymbolsTexture>,
    pub symbol_definitions: Vec<SymbolDefinition>,
    pub phrase_iterations: Vec<PhraseIteration>,
    pub phrase_extra_infos: Vec<PhraseExtraInfo>,
    pub nlinked_difficulties: Vec<NLinkedDifficulty>,
    pub actions: Vec<Action>,
    pub events: Vec<Event>,
    pub tones: Vec<Tone>,
    pub dnas: Vec<Dna>,
    pub sections: Vec<Section>,
    pub arrangements: Vec<Arrangement>,
    pub metadata: Metadata,
}
