use super::{XmlWriter, format_fixed};
use crate::structs::SongData;

pub(super) fn render_vocals(song: &SongData) -> String {
    let mut w = XmlWriter::new();
    w.open("vocals").attr("count", song.vocals.len());

    for vocal in &song.vocals {
        w.open("vocal")
            .attr("time", format_fixed(vocal.time))
            .attr("note", vocal.note)
            .attr("length", format_fixed(vocal.length))
            .attr("lyric", &vocal.lyric)
            .close();
    }

    w.finish()
}
