use super::{XmlWriter, format_fixed, format_plain};
use crate::manifest::{ArrangementProperties, SongManifest};
use crate::structs::{Arrangement, ChordNotes, Note, NoteMask, SongData};

pub(super) fn render_instrumental(song: &SongData, manifest: Option<&SongManifest>) -> String {
    let mut w = XmlWriter::new();
    w.open("song").attr("version", 8);

    write_header(&mut w, song, manifest);
    write_phrases(&mut w, song);
    write_phrase_iterations(&mut w, song);
    write_new_linked_diffs(&mut w, song);
    write_phrase_properties(&mut w, song);
    write_chord_templates(&mut w, song);
    write_ebeats(&mut w, song);
    write_tone_names(&mut w, manifest);
    write_tones(&mut w, song, manifest);
    write_sections(&mut w, song);
    write_events(&mut w, song);
    write_transcription_track(&mut w);
    write_levels(&mut w, song);

    w.finish()
}

fn overlay_str<'a>(value: &'a Option<String>) -> &'a str {
    value.as_deref().unwrap_or("")
}

fn write_header(w: &mut XmlWriter, song: &SongData, manifest: Option<&SongManifest>) {
    let meta = &song.metadata;
    let empty = SongManifest::default();
    let overlay = manifest.unwrap_or(&empty);

    w.text_element("title", overlay_str(&overlay.title));
    w.text_element("arrangement", overlay_str(&overlay.arrangement));
    w.text_element("part", meta.part);
    w.text_element("offset", format_fixed(-meta.start_time));
    w.text_element("centOffset", format_plain(overlay.cent_offset.unwrap_or(0.0)));
    w.text_element("songLength", format_fixed(meta.song_length));
    w.text_element("songNameSort", overlay_str(&overlay.song_name_sort));
    w.text_element("startBeat", format_fixed(meta.start_time));
    w.text_element(
        "averageTempo",
        format_fixed(overlay.average_tempo.unwrap_or(120.0)),
    );

    w.open("tuning");
    for string in 0..6 {
        let value = meta.tuning.get(string).copied().unwrap_or(0);
        w.attr(&format!("string{string}"), value);
    }
    w.close();

    w.text_element("capo", i32::from(meta.capo_fret_id).max(0));
    w.text_element("artistName", overlay_str(&overlay.artist_name));
    w.text_element("artistNameSort", overlay_str(&overlay.artist_name_sort));
    w.text_element("albumName", overlay_str(&overlay.album_name));
    w.text_element("albumNameSort", overlay_str(&overlay.album_name_sort));
    w.text_element("albumYear", overlay.album_year.unwrap_or(0));
    w.text_element("crowdSpeed", 1);

    write_arrangement_properties(w, &overlay.arrangement_properties.unwrap_or_default());

    w.text_element("lastConversionDateTime", &meta.last_conversion_date_time);
}

fn write_arrangement_properties(w: &mut XmlWriter, props: &ArrangementProperties) {
    w.open("arrangementProperties")
        .attr("represent", props.represent)
        .attr("bonusArr", props.bonus_arr)
        .attr("standardTuning", props.standard_tuning)
        .attr("nonStandardChords", props.non_standard_chords)
        .attr("barreChords", props.barre_chords)
        .attr("powerChords", props.power_chords)
        .attr("dropDPower", props.drop_d_power)
        .attr("openChords", props.open_chords)
        .attr("fingerPicking", props.finger_picking)
        .attr("pickDirection", props.pick_direction)
        .attr("doubleStops", props.double_stops)
        .attr("palmMutes", props.palm_mutes)
        .attr("harmonics", props.harmonics)
        .attr("pinchHarmonics", props.pinch_harmonics)
        .attr("hopo", props.hopo)
        .attr("tremolo", props.tremolo)
        .attr("slides", props.slides)
        .attr("unpitchedSlides", props.unpitched_slides)
        .attr("bends", props.bends)
        .attr("tapping", props.tapping)
        .attr("vibrato", props.vibrato)
        .attr("fretHandMutes", props.fret_hand_mutes)
        .attr("slapPop", props.slap_pop)
        .attr("twoFingerPicking", props.two_finger_picking)
        .attr("fifthsAndOctaves", props.fifths_and_octaves)
        .attr("syncopation", props.syncopation)
        .attr("bassPick", props.bass_pick)
        .attr("sustain", props.sustain)
        .attr("pathLead", props.path_lead)
        .attr("pathRhythm", props.path_rhythm)
        .attr("pathBass", props.path_bass)
        .close();
}

fn write_phrases(w: &mut XmlWriter, song: &SongData) {
    w.open("phrases").attr("count", song.phrases.len());
    for phrase in &song.phrases {
        w.open("phrase")
            .attr("maxDifficulty", phrase.max_difficulty)
            .attr("name", &phrase.name);
        if phrase.disparity == 1 {
            w.attr("disparity", 1);
        }
        if phrase.ignore == 1 {
            w.attr("ignore", 1);
        }
        if phrase.solo == 1 {
            w.attr("solo", 1);
        }
        w.close();
    }
    w.close();
}

fn write_phrase_iterations(w: &mut XmlWriter, song: &SongData) {
    w.open("phraseIterations")
        .attr("count", song.phrase_iterations.len());
    for iteration in &song.phrase_iterations {
        w.open("phraseIteration")
            .attr("time", format_fixed(iteration.start_time))
            .attr("phraseId", iteration.phrase_id);
        if iteration.difficulty.iter().any(|&d| d > 0) {
            w.open("heroLevels").attr("count", 3);
            for (hero, &difficulty) in iteration.difficulty.iter().enumerate() {
                w.open("heroLevel")
                    .attr("hero", hero + 1)
                    .attr("difficulty", difficulty)
                    .close();
            }
            w.close();
        }
        w.close();
    }
    w.close();
}

fn write_new_linked_diffs(w: &mut XmlWriter, song: &SongData) {
    w.open("newLinkedDiffs")
        .attr("count", song.nlinked_difficulties.len());
    for nld in &song.nlinked_difficulties {
        w.open("newLinkedDiff")
            .attr("levelBreak", nld.level_break)
            .attr("ratio", "1.000")
            .attr("phraseCount", nld.nld_phrases.len());
        for &phrase_id in &nld.nld_phrases {
            w.open("nld_phrase").attr("id", phrase_id).close();
        }
        w.close();
    }
    w.close();
}

fn write_phrase_properties(w: &mut XmlWriter, song: &SongData) {
    w.open("phraseProperties")
        .attr("count", song.phrase_extra_infos.len());
    for info in &song.phrase_extra_infos {
        w.open("phraseProperty")
            .attr("phraseId", info.phrase_id)
            .attr("redundant", info.redundant)
            .attr("levelJump", info.level_jump)
            .attr("empty", info.empty)
            .attr("difficulty", info.difficulty)
            .close();
    }
    w.close();
}

fn write_chord_templates(w: &mut XmlWriter, song: &SongData) {
    w.open("chordTemplates").attr("count", song.chords.len());
    for chord in &song.chords {
        let display_name = match chord.mask {
            1 => format!("{}-arp", chord.name),
            2 => format!("{}-nop", chord.name),
            _ => chord.name.clone(),
        };
        w.open("chordTemplate")
            .attr("chordName", &chord.name)
            .attr("displayName", display_name);
        for (string, &finger) in chord.fingers.iter().enumerate() {
            if finger != -1 {
                w.attr(&format!("finger{string}"), finger);
            }
        }
        for (string, &fret) in chord.frets.iter().enumerate() {
            if fret != -1 {
                w.attr(&format!("fret{string}"), fret);
            }
        }
        w.close();
    }
    w.close();
}

fn write_ebeats(w: &mut XmlWriter, song: &SongData) {
    w.open("ebeats").attr("count", song.beats.len());
    for beat in &song.beats {
        w.open("ebeat").attr("time", format_fixed(beat.time));
        if beat.mask & 0x01 != 0 {
            w.attr("measure", beat.measure);
        }
        w.close();
    }
    w.close();
}

fn write_tone_names(w: &mut XmlWriter, manifest: Option<&SongManifest>) {
    let Some(manifest) = manifest else {
        return;
    };

    if let Some(base) = manifest.tone_base.as_deref()
        && !base.is_empty()
    {
        w.text_element("tonebase", base);
    }

    const TONE_TAGS: [&str; 4] = ["tonea", "toneb", "tonec", "toned"];
    for (slot, tag) in TONE_TAGS.iter().enumerate() {
        if let Some(name) = manifest.tone_names[slot].as_deref()
            && !name.is_empty()
        {
            w.text_element(tag, name);
        }
    }
}

fn write_tones(w: &mut XmlWriter, song: &SongData, manifest: Option<&SongManifest>) {
    w.open("tones").attr("count", song.tones.len());
    for tone in &song.tones {
        let name = match (manifest, tone.tone_id) {
            (Some(overlay), id @ 0..=3) => {
                overlay.tone_names[id as usize].clone().unwrap_or_default()
            }
            _ => "N/A".to_owned(),
        };
        w.open("tone")
            .attr("time", format_fixed(tone.time))
            .attr("id", tone.tone_id)
            .attr("name", name)
            .close();
    }
    w.close();
}

fn write_sections(w: &mut XmlWriter, song: &SongData) {
    w.open("sections").attr("count", song.sections.len());
    for section in &song.sections {
        w.open("section")
            .attr("name", &section.name)
            .attr("number", section.number)
            .attr("startTime", format_fixed(section.start_time))
            .close();
    }
    w.close();
}

fn write_events(w: &mut XmlWriter, song: &SongData) {
    w.open("events").attr("count", song.events.len());
    for event in &song.events {
        w.open("event")
            .attr("time", format_fixed(event.time))
            .attr("code", &event.name)
            .close();
    }
    w.close();
}

fn write_transcription_track(w: &mut XmlWriter) {
    w.open("transcriptionTrack").attr("difficulty", -1);
    for child in ["notes", "chords", "anchors", "handShapes"] {
        w.open(child).attr("count", 0).close();
    }
    w.close();
}

fn write_levels(w: &mut XmlWriter, song: &SongData) {
    w.open("levels").attr("count", song.arrangements.len());
    for arrangement in &song.arrangements {
        write_level(w, song, arrangement);
    }
    w.close();
}

fn write_level(w: &mut XmlWriter, song: &SongData, arrangement: &Arrangement) {
    w.open("level").attr("difficulty", arrangement.difficulty);

    // Notes carrying a chord reference become <chord> elements; everything
    // else is a single note.
    let (chords, singles): (Vec<&Note>, Vec<&Note>) = arrangement
        .notes
        .iter()
        .partition(|note| note.chord_id >= 0 && note.mask.contains(NoteMask::Chord));

    w.open("notes").attr("count", singles.len());
    for note in &singles {
        write_single_note(w, note);
    }
    w.close();

    w.open("chords").attr("count", chords.len());
    for note in &chords {
        write_chord(w, song, note);
    }
    w.close();

    write_anchors(w, arrangement);
    write_hand_shapes(w, arrangement);

    w.close();
}

fn write_single_note(w: &mut XmlWriter, note: &Note) {
    w.open("note")
        .attr("time", format_fixed(note.time))
        .attr("string", note.string)
        .attr("fret", note.fret);
    if note.sustain > 0.0 {
        w.attr("sustain", format_fixed(note.sustain));
    }
    write_note_technique_attrs(w, note);
    write_bend_values(w, &note.bend_values);
    w.close();
}

fn write_note_technique_attrs(w: &mut XmlWriter, note: &Note) {
    let mask = note.mask;
    if mask.contains(NoteMask::Parent) {
        w.attr("linkNext", 1);
    }
    if mask.contains(NoteMask::Accent) {
        w.attr("accent", 1);
    }
    if !note.bend_values.is_empty() {
        w.attr("bend", format_plain(note.max_bend));
    }
    if mask.contains(NoteMask::HammerOn) {
        w.attr("hammerOn", 1);
    }
    if mask.contains(NoteMask::Harmonic) {
        w.attr("harmonic", 1);
    }
    if mask.contains(NoteMask::HammerOn) || mask.contains(NoteMask::PullOff) {
        w.attr("hopo", 1);
    }
    if mask.contains(NoteMask::Ignore) {
        w.attr("ignore", 1);
    }
    if let Some(left_hand) = note.left_hand {
        w.attr("leftHand", left_hand);
    }
    if mask.contains(NoteMask::Mute) {
        w.attr("mute", 1);
    }
    if mask.contains(NoteMask::PalmMute) {
        w.attr("palmMute", 1);
    }
    if mask.contains(NoteMask::Pluck) {
        w.attr("pluck", 1);
    }
    if mask.contains(NoteMask::PullOff) {
        w.attr("pullOff", 1);
    }
    if mask.contains(NoteMask::Slap) {
        w.attr("slap", 1);
    }
    if mask.contains(NoteMask::Slide)
        && let Some(slide_to) = note.slide_to
    {
        w.attr("slideTo", slide_to);
    }
    if mask.contains(NoteMask::Tremolo) {
        w.attr("tremolo", 1);
    }
    if mask.contains(NoteMask::PinchHarmonic) {
        w.attr("harmonicPinch", 1);
    }
    if note.pick_direction > 0 {
        w.attr("pickDirection", 1);
    }
    if mask.contains(NoteMask::RightHand) {
        w.attr("rightHand", 1);
    }
    if mask.contains(NoteMask::SlideUnpitchedTo)
        && let Some(slide_to) = note.slide_unpitch_to
    {
        w.attr("slideUnpitchTo", slide_to);
    }
    if mask.contains(NoteMask::Tap) {
        w.attr("tap", i32::from(note.tap).max(0));
    }
    if mask.contains(NoteMask::Vibrato) && note.vibrato > 0 {
        w.attr("vibrato", note.vibrato);
    }
}

fn write_chord(w: &mut XmlWriter, song: &SongData, note: &Note) {
    w.open("chord")
        .attr("time", format_fixed(note.time))
        .attr("chordId", note.chord_id);

    let mask = note.mask;
    if mask.contains(NoteMask::Parent) {
        w.attr("linkNext", 1);
    }
    if mask.contains(NoteMask::Accent) {
        w.attr("accent", 1);
    }
    if mask.contains(NoteMask::FretHandMute) {
        w.attr("fretHandMute", 1);
    }
    if mask.contains(NoteMask::HighDensity) {
        w.attr("highDensity", 1);
    }
    if mask.contains(NoteMask::Ignore) {
        w.attr("ignore", 1);
    }
    if mask.contains(NoteMask::PalmMute) {
        w.attr("palmMute", 1);
    }
    if mask.contains(NoteMask::HammerOn) || mask.contains(NoteMask::PullOff) {
        w.attr("hopo", 1);
    }

    if mask.contains(NoteMask::ChordPanel) {
        for string in 0..6 {
            write_chord_note(w, song, note, string);
        }
    }

    w.close();
}

/// Expand one `<chordNote>` from the chord's template, skipping strings the
/// template leaves open.
fn write_chord_note(w: &mut XmlWriter, song: &SongData, note: &Note, string: usize) {
    let Some(template) = usize::try_from(note.chord_id)
        .ok()
        .and_then(|id| song.chords.get(id))
    else {
        return;
    };
    if template.frets[string] < 0 {
        return;
    }

    w.open("chordNote")
        .attr("time", format_fixed(note.time))
        .attr("string", string)
        .attr("fret", template.frets[string]);
    if note.sustain > 0.0 {
        w.attr("sustain", format_fixed(note.sustain));
    }

    let left_hand = template.fingers[string];

    let chord_notes = usize::try_from(note.chord_notes_id)
        .ok()
        .and_then(|id| song.chord_notes.get(id));
    let Some(chord_notes) = chord_notes else {
        if left_hand != -1 {
            w.attr("leftHand", left_hand);
        }
        w.close();
        return;
    };

    write_chord_note_technique_attrs(w, chord_notes, string, left_hand);
    write_bend_values(w, &chord_notes.bend_data[string]);
    w.close();
}

fn write_chord_note_technique_attrs(
    w: &mut XmlWriter,
    chord_notes: &ChordNotes,
    string: usize,
    left_hand: i8,
) {
    let mask = chord_notes.mask[string];
    if mask.contains(NoteMask::Parent) {
        w.attr("linkNext", 1);
    }
    if mask.contains(NoteMask::Accent) {
        w.attr("accent", 1);
    }
    if !chord_notes.bend_data[string].is_empty() {
        w.attr("bend", "0");
    }
    if mask.contains(NoteMask::HammerOn) {
        w.attr("hammerOn", 1);
    }
    if mask.contains(NoteMask::Harmonic) {
        w.attr("harmonic", 1);
    }
    if mask.contains(NoteMask::HammerOn) || mask.contains(NoteMask::PullOff) {
        w.attr("hopo", 1);
    }
    if mask.contains(NoteMask::Ignore) {
        w.attr("ignore", 1);
    }
    if left_hand != -1 {
        w.attr("leftHand", left_hand);
    }
    if mask.contains(NoteMask::Mute) {
        w.attr("mute", 1);
    }
    if mask.contains(NoteMask::PalmMute) {
        w.attr("palmMute", 1);
    }
    if mask.contains(NoteMask::Pluck) {
        w.attr("pluck", 1);
    }
    if mask.contains(NoteMask::PullOff) {
        w.attr("pullOff", 1);
    }
    if mask.contains(NoteMask::Slap) {
        w.attr("slap", 1);
    }
    if mask.contains(NoteMask::Slide)
        && let Some(slide_to) = chord_notes.slide_to[string]
    {
        w.attr("slideTo", slide_to);
    }
    if mask.contains(NoteMask::Tremolo) {
        w.attr("tremolo", 1);
    }
    if mask.contains(NoteMask::PinchHarmonic) {
        w.attr("harmonicPinch", 1);
    }
    if mask.contains(NoteMask::RightHand) {
        w.attr("rightHand", 1);
    }
    if mask.contains(NoteMask::SlideUnpitchedTo)
        && let Some(slide_to) = chord_notes.slide_unpitch_to[string]
    {
        w.attr("slideUnpitchTo", slide_to);
    }
    if mask.contains(NoteMask::Vibrato) && chord_notes.vibrato[string] > 0 {
        w.attr("vibrato", chord_notes.vibrato[string]);
    }
}

fn write_bend_values(w: &mut XmlWriter, bends: &[crate::structs::BendValue]) {
    if bends.is_empty() {
        return;
    }

    w.open("bendValues").attr("count", bends.len());
    for bend in bends {
        w.open("bendValue").attr("time", format_fixed(bend.time));
        if bend.step.abs() > 1e-6 {
            w.attr("step", format_fixed(bend.step));
        }
        w.close();
    }
    w.close();
}

fn write_anchors(w: &mut XmlWriter, arrangement: &Arrangement) {
    w.open("anchors").attr("count", arrangement.anchors.len());
    for anchor in &arrangement.anchors {
        w.open("anchor")
            .attr("time", format_fixed(anchor.start_time))
            .attr("fret", anchor.fret)
            .attr("width", format_fixed(anchor.width as f32))
            .close();
    }
    w.close();
}

/// Handshape and arpeggio fingerprints share a layout; merge both streams
/// into one list ordered by start time (stable, so same-time spans keep
/// their insertion order).
fn write_hand_shapes(w: &mut XmlWriter, arrangement: &Arrangement) {
    let mut shapes: Vec<_> = arrangement
        .fingerprints_handshape
        .iter()
        .chain(&arrangement.fingerprints_arpeggio)
        .collect();
    shapes.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    w.open("handShapes").attr("count", shapes.len());
    for shape in shapes {
        w.open("handShape")
            .attr("chordId", shape.chord_id)
            .attr("startTime", format_fixed(shape.start_time))
            .attr("endTime", format_fixed(shape.end_time))
            .close();
    }
    w.close();
}
