//! Song-level metadata from the JSON manifest that ships beside each SNG.
//!
//! The manifest is an attribute bag under `Entries -> <first> -> Attributes`.
//! Keys appear in PascalCase in official content and camelCase in
//! community content, so every lookup accepts both spellings; the first
//! match wins. Every field is independently optional.

use serde_json::Value;

/// Optional overlay of metadata the SNG binary itself does not carry.
#[derive(Debug, Clone, Default)]
pub struct SongManifest {
    pub title: Option<String>,
    pub arrangement: Option<String>,
    pub cent_offset: Option<f32>,
    pub song_name_sort: Option<String>,
    pub average_tempo: Option<f32>,
    pub artist_name: Option<String>,
    pub artist_name_sort: Option<String>,
    pub album_name: Option<String>,
    pub album_name_sort: Option<String>,
    pub album_year: Option<i32>,
    pub tone_base: Option<String>,
    pub tone_names: [Option<String>; 4],
    pub arrangement_properties: Option<ArrangementProperties>,
}

/// The manifest's boolean-as-int arrangement flags, defaulted to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrangementProperties {
    pub represent: i32,
    pub bonus_arr: i32,
    pub standard_tuning: i32,
    pub non_standard_chords: i32,
    pub barre_chords: i32,
    pub power_chords: i32,
    pub drop_d_power: i32,
    pub open_chords: i32,
    pub finger_picking: i32,
    pub pick_direction: i32,
    pub double_stops: i32,
    pub palm_mutes: i32,
    pub harmonics: i32,
    pub pinch_harmonics: i32,
    pub hopo: i32,
    pub tremolo: i32,
    pub slides: i32,
    pub unpitched_slides: i32,
    pub bends: i32,
    pub tapping: i32,
    pub vibrato: i32,
    pub fret_hand_mutes: i32,
    pub slap_pop: i32,
    pub two_finger_picking: i32,
    pub fifths_and_octaves: i32,
    pub syncopation: i32,
    pub bass_pick: i32,
    pub sustain: i32,
    pub path_lead: i32,
    pub path_rhythm: i32,
    pub path_bass: i32,
}

impl SongManifest {
    /// Parse a manifest JSON blob. Returns `None` when the text is not
    /// valid JSON or lacks the expected `Entries`/`Attributes` shape.
    pub fn from_json(text: &str) -> Option<Self> {
        let payload = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        let root: Value = serde_json::from_str(payload).ok()?;
        let attributes = resolve_attributes(&root)?;

        let mut manifest = SongManifest {
            title: get_string(attributes, &["SongName", "songName"]),
            arrangement: get_string(attributes, &["ArrangementName", "arrangementName"]),
            cent_offset: get_f32(attributes, &["CentOffset", "centOffset"]),
            song_name_sort: get_string(attributes, &["SongNameSort", "songNameSort"]),
            average_tempo: get_f32(attributes, &["SongAverageTempo", "songAverageTempo"]),
            artist_name: get_string(attributes, &["ArtistName", "artistName"]),
            artist_name_sort: get_string(attributes, &["ArtistNameSort", "artistNameSort"]),
            album_name: get_string(attributes, &["AlbumName", "albumName"]),
            album_name_sort: get_string(attributes, &["AlbumNameSort", "albumNameSort"]),
            album_year: get_i32(attributes, &["SongYear", "songYear"]),
            tone_base: get_string(attributes, &["Tone_Base", "toneBase"]),
            ..SongManifest::default()
        };
        manifest.tone_names = [
            get_string(attributes, &["Tone_A", "toneA"]),
            get_string(attributes, &["Tone_B", "toneB"]),
            get_string(attributes, &["Tone_C", "toneC"]),
            get_string(attributes, &["Tone_D", "toneD"]),
        ];

        if let Some(props) =
            find_key(attributes, &["ArrangementProperties", "arrangementProperties"])
                .filter(|value| value.is_object())
        {
            manifest.arrangement_properties = Some(read_arrangement_properties(props));
        }

        Some(manifest)
    }
}

fn resolve_attributes(root: &Value) -> Option<&Value> {
    let entries = find_key(root, &["Entries", "entries"])?;
    let first = entries.as_object()?.values().next()?;
    find_key(first, &["Attributes", "attributes"]).filter(|value| value.is_object())
}

fn find_key<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = obj.as_object()?;
    keys.iter().find_map(|key| map.get(*key))
}

fn get_string(obj: &Value, keys: &[&str]) -> Option<String> {
    find_key(obj, keys)?.as_str().map(str::to_owned)
}

fn get_f32(obj: &Value, keys: &[&str]) -> Option<f32> {
    find_key(obj, keys)?.as_f64().map(|value| value as f32)
}

fn get_i32(obj: &Value, keys: &[&str]) -> Option<i32> {
    let value = find_key(obj, keys)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .map(|value| value as i32)
}

fn get_flag(obj: &Value, key: &str) -> i32 {
    get_i32(obj, &[key]).unwrap_or(0)
}

fn read_arrangement_properties(props: &Value) -> ArrangementProperties {
    ArrangementProperties {
        represent: get_flag(props, "represent"),
        bonus_arr: get_flag(props, "bonusArr"),
        standard_tuning: get_flag(props, "standardTuning"),
        non_standard_chords: get_flag(props, "nonStandardChords"),
        barre_chords: get_flag(props, "barreChords"),
        power_chords: get_flag(props, "powerChords"),
        drop_d_power: get_flag(props, "dropDPower"),
        open_chords: get_flag(props, "openChords"),
        finger_picking: get_flag(props, "fingerPicking"),
        pick_direction: get_flag(props, "pickDirection"),
        double_stops: get_flag(props, "doubleStops"),
        palm_mutes: get_flag(props, "palmMutes"),
        harmonics: get_flag(props, "harmonics"),
        pinch_harmonics: get_flag(props, "pinchHarmonics"),
        hopo: get_flag(props, "hopo"),
        tremolo: get_flag(props, "tremolo"),
        slides: get_flag(props, "slides"),
        unpitched_slides: get_flag(props, "unpitchedSlides"),
        bends: get_flag(props, "bends"),
        tapping: get_flag(props, "tapping"),
        vibrato: get_flag(props, "vibrato"),
        fret_hand_mutes: get_flag(props, "fretHandMutes"),
        slap_pop: get_flag(props, "slapPop"),
        two_finger_picking: get_flag(props, "twoFingerPicking"),
        fifths_and_octaves: get_flag(props, "fifthsAndOctaves"),
        syncopation: get_flag(props, "syncopation"),
        bass_pick: get_flag(props, "bassPick"),
        sustain: get_flag(props, "sustain"),
        path_lead: get_flag(props, "pathLead"),
        path_rhythm: get_flag(props, "pathRhythm"),
        path_bass: get_flag(props, "pathBass"),
    }
}
