use crate::metadata::Id3Data;
use anyhow::{Context, Result};
use id3::{ErrorKind, Tag, TagLike};
use std::path::Path;

/// Reads the ID3 tag of an audio file. Files without a tag yield an empty
/// `Id3Data`.
pub fn read_id3_data(path: &Path) -> Result<Id3Data> {
    let tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(err) if matches!(err.kind, ErrorKind::NoTag) => return Ok(Id3Data::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("could not read ID3 tag: {}", path.display()))
        }
    };

    Ok(Id3Data {
        title: tag.title().map(str::to_string),
        artist: tag.artist().map(str::to_string),
        album: tag.album().map(str::to_string),
        album_artist: tag.album_artist().map(str::to_string),
        genre: tag.genre().map(str::to_string),
        year: tag.year().map(|v| v.to_string()),
        track: tag.track().map(|v| v.to_string()),
        total_tracks: tag.total_tracks().map(|v| v.to_string()),
        disc: tag.disc().map(|v| v.to_string()),
        total_discs: tag.total_discs().map(|v| v.to_string()),
    })
}
