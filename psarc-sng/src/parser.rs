//! Parser for the SNG plaintext stream.
//!
//! The stream has no index: eighteen sections follow each other in a fixed
//! order, each a 32-bit little-endian count followed by that many records.
//! The three symbol sections exist only in vocal-type files and their
//! presence is keyed on the vocals section being non-empty. A well-formed
//! stream is consumed exactly; leftover bytes are an error.

use enumflags2::BitFlags;

use crate::error::SngError;
use crate::memory::ByteReader;
use crate::structs::{
    Action, Anchor, AnchorExtension, Arrangement, Beat, BendValue, ChordNotes, ChordTemplate, Dna,
    Event, Fingerprint, Metadata, NLinkedDifficulty, Note, NoteMask, Phrase, PhraseExtraInfo,
    PhraseIteration, Section, SongData, SymbolDefinition, SymbolsHeader, SymbolsTexture, Tone,
    Vocal,
};

/// Parse one complete SNG plaintext buffer.
pub fn parse(data: &[u8]) -> Result<SongData, SngError> {
    if data.is_empty() {
        return Err(SngError::TooShort { len: 0 });
    }

    let mut reader = ByteReader::new(data);
    let mut song = SongData {
        beats: read_beats(&mut reader)?,
        phrases: read_phrases(&mut reader)?,
        chords: read_chords(&mut reader)?,
        chord_notes: read_chord_notes(&mut reader)?,
        vocals: read_vocals(&mut reader)?,
        ..SongData::default()
    };

    if !song.vocals.is_empty() {
        song.symbols_headers = read_symbols_headers(&mut reader)?;
        song.symbols_textures = read_symbols_textures(&mut reader)?;
        song.symbol_definitions = read_symbol_definitions(&mut reader)?;
    }

    song.phrase_iterations = read_phrase_iterations(&mut reader)?;
    song.phrase_extra_infos = read_phrase_extra_infos(&mut reader)?;
    song.nlinked_difficulties = read_nlinked_difficulties(&mut reader)?;
    song.actions = read_actions(&mut reader)?;
    song.events = read_events(&mut reader)?;
    song.tones = read_tones(&mut reader)?;
    song.dnas = read_dnas(&mut reader)?;
    song.sections = read_sections(&mut reader)?;
    song.arrangements = read_arrangements(&mut reader)?;
    song.metadata = read_metadata(&mut reader)?;

    if reader.position() != reader.len() {
        return Err(SngError::TrailingBytes {
            remaining: reader.remaining(),
        });
    }

    Ok(song)
}

fn read_count(reader: &mut ByteReader) -> Result<usize, SngError> {
    Ok(reader.read_i32()?.max(0) as usize)
}

fn note_mask(raw: u32) -> BitFlags<NoteMask> {
    BitFlags::from_bits_truncate(raw)
}

/// `0xFF` is the absent sentinel for fret-like byte fields.
fn sentinel(raw: u8) -> Option<u8> {
    if raw == 0xFF { None } else { Some(raw) }
}

/// Template frets and fingers keep the `-1` form because emission compares
/// against it directly.
fn sentinel_i8(raw: u8) -> i8 {
    if raw == 0xFF { -1 } else { raw as i8 }
}

fn read_bend_value(reader: &mut ByteReader) -> Result<BendValue, SngError> {
    Ok(BendValue {
        time: reader.read_f32()?,
        step: reader.read_f32()?,
        unk1: reader.read_i16()?,
        unk2: reader.read_u8()?,
        unk3: reader.read_u8()?,
    })
}

fn read_beats(reader: &mut ByteReader) -> Result<Vec<Beat>, SngError> {
    let count = read_count(reader)?;
    let mut beats = Vec::with_capacity(count);
    for _ in 0..count {
        beats.push(Beat {
            time: reader.read_f32()?,
            measure: reader.read_i16()?,
            beat: reader.read_i16()?,
            phrase_iteration: reader.read_i32()?,
            mask: reader.read_i32()?,
        });
    }
    Ok(beats)
}

fn read_phrases(reader: &mut ByteReader) -> Result<Vec<Phrase>, SngError> {
    let count = read_count(reader)?;
    let mut phrases = Vec::with_capacity(count);
    for _ in 0..count {
        phrases.push(Phrase {
            solo: reader.read_u8()?,
            disparity: reader.read_u8()?,
            ignore: reader.read_u8()?,
            padding: reader.read_u8()?,
            max_difficulty: reader.read_i32()?,
            phrase_iteration_links: reader.read_i32()?,
            name: reader.read_fixed_string(32)?,
        });
    }
    Ok(phrases)
}

fn read_chords(reader: &mut ByteReader) -> Result<Vec<ChordTemplate>, SngError> {
    let count = read_count(reader)?;
    let mut chords = Vec::with_capacity(count);
    for _ in 0..count {
        let mask = reader.read_u32()?;
        let mut frets = [0i8; 6];
        for fret in &mut frets {
            *fret = sentinel_i8(reader.read_u8()?);
        }
        let mut fingers = [0i8; 6];
        for finger in &mut fingers {
            *finger = sentinel_i8(reader.read_u8()?);
        }
        let mut notes = [0i32; 6];
        for note in &mut notes {
            *note = reader.read_i32()?;
        }
        chords.push(ChordTemplate {
            mask,
            frets,
            fingers,
            notes,
            name: reader.read_fixed_string(32)?,
        });
    }
    Ok(chords)
}

fn read_chord_notes(reader: &mut ByteReader) -> Result<Vec<ChordNotes>, SngError> {
    let count = read_count(reader)?;
    let mut chord_notes = Vec::with_capacity(count);
    for _ in 0..count {
        let mut cn = ChordNotes::default();
        for mask in &mut cn.mask {
            *mask = note_mask(reader.read_u32()?);
        }
        // Each string carries a fixed block of 32 bend slots followed by the
        // number actually in use.
        for bends in &mut cn.bend_data {
            let mut slots = Vec::with_capacity(32);
            for _ in 0..32 {
                slots.push(read_bend_value(reader)?);
            }
            let used_count = reader.read_i32()?.clamp(0, 32) as usize;
            slots.truncate(used_count);
            *bends = slots;
        }
        for slide in &mut cn.slide_to {
            *slide = sentinel(reader.read_u8()?);
        }
        for slide in &mut cn.slide_unpitch_to {
            *slide = sentinel(reader.read_u8()?);
        }
        for vibrato in &mut cn.vibrato {
            *vibrato = reader.read_i16()?;
        }
        chord_notes.push(cn);
    }
    Ok(chord_notes)
}

fn read_vocals(reader: &mut ByteReader) -> Result<Vec<Vocal>, SngError> {
    let count = read_count(reader)?;
    let mut vocals = Vec::with_capacity(count);
    for _ in 0..count {
        vocals.push(Vocal {
            time: reader.read_f32()?,
            note: reader.read_i32()?,
            length: reader.read_f32()?,
            lyric: reader.read_fixed_string(48)?,
        });
    }
    Ok(vocals)
}

fn read_symbols_headers(reader: &mut ByteReader) -> Result<Vec<SymbolsHeader>, SngError> {
    let count = read_count(reader)?;
    let mut headers = Vec::with_capacity(count);
    for _ in 0..count {
        let mut unk = [0i32; 8];
        for value in &mut unk {
            *value = reader.read_i32()?;
        }
        headers.push(SymbolsHeader { unk });
    }
    Ok(headers)
}

fn read_symbols_textures(reader: &mut ByteReader) -> Result<Vec<SymbolsTexture>, SngError> {
    let count = read_count(reader)?;
    let mut textures = Vec::with_capacity(count);
    for _ in 0..count {
        textures.push(SymbolsTexture {
            font_name: reader.read_fixed_string(128)?,
            font_path_length: reader.read_i32()?,
            unk: reader.read_i32()?,
            width: reader.read_i32()?,
            height: reader.read_i32()?,
        });
    }
    Ok(textures)
}

fn read_symbol_definitions(reader: &mut ByteReader) -> Result<Vec<SymbolDefinition>, SngError> {
    let count = read_count(reader)?;
    let mut definitions = Vec::with_capacity(count);
    for _ in 0..count {
        let text = reader.read_fixed_string(12)?;
        let mut rect_outer = [0f32; 4];
        for value in &mut rect_outer {
            *value = reader.read_f32()?;
        }
        let mut rect_inner = [0f32; 4];
        for value in &mut rect_inner {
            *value = reader.read_f32()?;
        }
        definitions.push(SymbolDefinition {
            text,
            rect_outer,
            rect_inner,
        });
    }
    Ok(definitions)
}

fn read_phrase_iterations(reader: &mut ByteReader) -> Result<Vec<PhraseIteration>, SngError> {
    let count = read_count(reader)?;
    let mut iterations = Vec::with_capacity(count);
    for _ in 0..count {
        let phrase_id = reader.read_i32()?;
        let start_time = reader.read_f32()?;
        let next_phrase_time = reader.read_f32()?;
        let mut difficulty = [0i32; 3];
        for value in &mut difficulty {
            *value = reader.read_i32()?;
        }
        iterations.push(PhraseIteration {
            phrase_id,
            start_time,
            next_phrase_time,
            difficulty,
        });
    }
    Ok(iterations)
}

fn read_phrase_extra_infos(reader: &mut ByteReader) -> Result<Vec<PhraseExtraInfo>, SngError> {
    let count = read_count(reader)?;
    let mut infos = Vec::with_capacity(count);
    for _ in 0..count {
        infos.push(PhraseExtraInfo {
            phrase_id: reader.read_i32()?,
            difficulty: reader.read_i32()?,
            empty: reader.read_i32()?,
            level_jump: reader.read_u8()?,
            redundant: reader.read_i16()?,
            padding: reader.read_u8()?,
        });
    }
    Ok(infos)
}

fn read_nlinked_difficulties(reader: &mut ByteReader) -> Result<Vec<NLinkedDifficulty>, SngError> {
    let count = read_count(reader)?;
    let mut nlds = Vec::with_capacity(count);
    for _ in 0..count {
        let level_break = reader.read_i32()?;
        let phrase_count = read_count(reader)?;
        let mut nld_phrases = Vec::with_capacity(phrase_count);
        for _ in 0..phrase_count {
            nld_phrases.push(reader.read_i32()?);
        }
        nlds.push(NLinkedDifficulty {
            level_break,
            nld_phrases,
        });
    }
    Ok(nlds)
}

fn read_actions(reader: &mut ByteReader) -> Result<Vec<Action>, SngError> {
    let count = read_count(reader)?;
    let mut actions = Vec::with_capacity(count);
    for _ in 0..count {
        actions.push(Action {
            time: reader.read_f32()?,
            name: reader.read_fixed_string(256)?,
        });
    }
    Ok(actions)
}

fn read_events(reader: &mut ByteReader) -> Result<Vec<Event>, SngError> {
    let count = read_count(reader)?;
    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        events.push(Event {
            time: reader.read_f32()?,
            name: reader.read_fixed_string(256)?,
        });
    }
    Ok(events)
}

fn read_tones(reader: &mut ByteReader) -> Result<Vec<Tone>, SngError> {
    let count = read_count(reader)?;
    let mut tones = Vec::with_capacity(count);
    for _ in 0..count {
        tones.push(Tone {
            time: reader.read_f32()?,
            tone_id: reader.read_i32()?,
        });
    }
    Ok(tones)
}

fn read_dnas(reader: &mut ByteReader) -> Result<Vec<Dna>, SngError> {
    let count = read_count(reader)?;
    let mut dnas = Vec::with_capacity(count);
    for _ in 0..count {
        dnas.push(Dna {
            time: reader.read_f32()?,
            dna_id: reader.read_i32()?,
        });
    }
    Ok(dnas)
}

fn read_sections(reader: &mut ByteReader) -> Result<Vec<Section>, SngError> {
    let count = read_count(reader)?;
    let mut sections = Vec::with_capacity(count);
    for _ in 0..count {
        let mut section = Section {
            name: reader.read_fixed_string(32)?,
            number: reader.read_i32()?,
            start_time: reader.read_f32()?,
            end_time: reader.read_f32()?,
            start_phrase_iteration_index: reader.read_i32()?,
            end_phrase_iteration_index: reader.read_i32()?,
            ..Section::default()
        };
        for byte in &mut section.string_bytes {
            *byte = reader.read_u8()?;
        }
        sections.push(section);
    }
    Ok(sections)
}

fn read_note(reader: &mut ByteReader) -> Result<Note, SngError> {
    let mut note = Note {
        mask: note_mask(reader.read_u32()?),
        flags: reader.read_u32()?,
        hash: reader.read_u32()?,
        time: reader.read_f32()?,
        string: reader.read_i8()?,
        fret: reader.read_i8()?,
        anchor_fret: reader.read_i8()?,
        anchor_width: reader.read_i8()?,
        chord_id: reader.read_i32()?,
        chord_notes_id: reader.read_i32()?,
        phrase_id: reader.read_i32()?,
        phrase_iteration_id: reader.read_i32()?,
        ..Note::default()
    };
    note.fingerprint_id[0] = reader.read_i16()?;
    note.fingerprint_id[1] = reader.read_i16()?;
    note.next_iteration = reader.read_i16()?;
    note.prev_iteration = reader.read_i16()?;
    note.parent_prev_note = reader.read_i16()?;
    note.slide_to = sentinel(reader.read_u8()?);
    note.slide_unpitch_to = sentinel(reader.read_u8()?);
    note.left_hand = sentinel(reader.read_u8()?);
    note.tap = reader.read_i8()?;
    note.pick_direction = reader.read_i8()?;
    note.slap = reader.read_i8()?;
    note.pluck = reader.read_i8()?;
    note.vibrato = reader.read_i16()?;
    note.sustain = reader.read_f32()?;
    note.max_bend = reader.read_f32()?;

    let bend_count = read_count(reader)?;
    note.bend_values.reserve(bend_count);
    for _ in 0..bend_count {
        note.bend_values.push(read_bend_value(reader)?);
    }

    Ok(note)
}

fn read_arrangements(reader: &mut ByteReader) -> Result<Vec<Arrangement>, SngError> {
    let count = read_count(reader)?;
    let mut arrangements = Vec::with_capacity(count);
    for _ in 0..count {
        let mut arr = Arrangement {
            difficulty: reader.read_i32()?,
            ..Arrangement::default()
        };

        let anchor_count = read_count(reader)?;
        arr.anchors.reserve(anchor_count);
        for _ in 0..anchor_count {
            arr.anchors.push(Anchor {
                start_time: reader.read_f32()?,
                end_time: reader.read_f32()?,
                unk1: reader.read_f32()?,
                unk2: reader.read_f32()?,
                fret: reader.read_i32()?,
                width: reader.read_i32()?,
                phrase_iteration_index: reader.read_i32()?,
            });
        }

        let extension_count = read_count(reader)?;
        arr.anchor_extensions.reserve(extension_count);
        for _ in 0..extension_count {
            arr.anchor_extensions.push(AnchorExtension {
                beat_time: reader.read_f32()?,
                fret_id: reader.read_u8()?,
                unk2: reader.read_i32()?,
                unk3: reader.read_i16()?,
                unk4: reader.read_u8()?,
            });
        }

        arr.fingerprints_handshape = read_fingerprints(reader)?;
        arr.fingerprints_arpeggio = read_fingerprints(reader)?;

        let note_count = read_count(reader)?;
        arr.notes.reserve(note_count);
        for _ in 0..note_count {
            arr.notes.push(read_note(reader)?);
        }

        // Three statistics arrays, each with its own independent count.
        let phrase_count = read_count(reader)?;
        arr.average_notes_per_iteration.reserve(phrase_count);
        for _ in 0..phrase_count {
            arr.average_notes_per_iteration.push(reader.read_f32()?);
        }

        let iteration_count1 = read_count(reader)?;
        arr.notes_in_iteration1.reserve(iteration_count1);
        for _ in 0..iteration_count1 {
            arr.notes_in_iteration1.push(reader.read_i32()?);
        }

        let iteration_count2 = read_count(reader)?;
        arr.notes_in_iteration2.reserve(iteration_count2);
        for _ in 0..iteration_count2 {
            arr.notes_in_iteration2.push(reader.read_i32()?);
        }

        arrangements.push(arr);
    }
    Ok(arrangements)
}

fn read_fingerprints(reader: &mut ByteReader) -> Result<Vec<Fingerprint>, SngError> {
    let count = read_count(reader)?;
    let mut fingerprints = Vec::with_capacity(count);
    for _ in 0..count {
        fingerprints.push(Fingerprint {
            chord_id: reader.read_i32()?,
            start_time: reader.read_f32()?,
            end_time: reader.read_f32()?,
            unk1: reader.read_f32()?,
            unk2: reader.read_f32()?,
        });
    }
    Ok(fingerprints)
}

fn read_metadata(reader: &mut ByteReader) -> Result<Metadata, SngError> {
    let mut meta = Metadata {
        max_score: reader.read_f64()?,
        max_notes_and_chords: reader.read_f64()?,
        max_notes_and_chords_real: reader.read_f64()?,
        point_per_note: reader.read_f64()?,
        first_beat_length: reader.read_f32()?,
        start_time: reader.read_f32()?,
        capo_fret_id: reader.read_i8()?,
        last_conversion_date_time: reader.read_fixed_string(32)?,
        part: reader.read_i16()?,
        song_length: reader.read_f32()?,
        ..Metadata::default()
    };

    let string_count = read_count(reader)?;
    meta.tuning.reserve(string_count);
    for _ in 0..string_count {
        meta.tuning.push(reader.read_i16()?);
    }

    meta.first_note_time = reader.read_f32()?;
    meta.first_note_time2 = reader.read_f32()?;
    meta.max_difficulty = reader.read_i32()?;
    Ok(meta)
}
