use std::path::Path;

use chrono::Datelike;
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::read_from_path;
use lofty::tag::{ItemKey, Tag};

use crate::error::AppError;
use crate::models::Episode;
use crate::reconcile::SHOW_NAME;

/// Album an episode is filed under.
pub fn album_name(episode: &Episode) -> String {
    format!("Podcasts {}", episode.release_date.year())
}

/// Write the episode's title, artist, album and track tags into `path`.
pub fn write_tags(path: &Path, episode: &Episode) -> Result<(), AppError> {
    let mut tagged_file = read_from_path(path)?;
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged_file.tag_mut(tag_type) else {
        return Err(AppError::Config(format!(
            "no writable {:?} tag for {}",
            tag_type,
            path.display()
        )));
    };

    let album = album_name(episode);
    tag.set_title(episode.title.clone());
    tag.set_artist(SHOW_NAME.to_string());
    tag.set_album(album.clone());
    tag.insert_text(ItemKey::AlbumArtistSortOrder, SHOW_NAME.to_string());
    tag.insert_text(ItemKey::AlbumTitleSortOrder, album);
    tag.insert_text(ItemKey::Year, episode.release_date.year().to_string());
    tag.insert_text(ItemKey::TrackNumber, episode.track_number.to_string());

    tagged_file.save_to_path(path, WriteOptions::default())?;
    tracing::debug!("Tagged {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, no padding.
    const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
    const FRAME_LEN: usize = 417;

    fn episode() -> Episode {
        Episode {
            id: 1,
            title: "Fri, 21 Mar - Animal Week".to_string(),
            filename: "Hamish & Andy - 2014-03-21 - Animal Week.mp3".to_string(),
            release_date: NaiveDate::from_ymd_opt(2014, 3, 21).unwrap(),
            track_number: 80,
            file_url: "http://x.test/a.mp3".to_string(),
        }
    }

    fn silent_mp3(frames: usize) -> Vec<u8> {
        let mut frame = vec![0u8; FRAME_LEN];
        frame[..4].copy_from_slice(&FRAME_HEADER);
        frame.repeat(frames)
    }

    #[test]
    fn album_is_per_release_year() {
        assert_eq!(album_name(&episode()), "Podcasts 2014");
    }

    #[test]
    fn tags_are_written_to_the_file() {
        let file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        std::fs::write(file.path(), silent_mp3(20)).unwrap();

        write_tags(file.path(), &episode()).unwrap();

        let tagged = read_from_path(file.path()).unwrap();
        let tag = tagged.primary_tag().expect("tag written");
        assert_eq!(tag.title().as_deref(), Some("Fri, 21 Mar - Animal Week"));
        assert_eq!(tag.artist().as_deref(), Some(SHOW_NAME));
        assert_eq!(tag.album().as_deref(), Some("Podcasts 2014"));
        assert_eq!(tag.track(), Some(80));
    }
}
