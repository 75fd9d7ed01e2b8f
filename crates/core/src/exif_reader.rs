use crate::metadata::ExifData;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{Exif, Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads the EXIF block of an image. Files without EXIF data yield an empty
/// `ExifData` rather than an error.
pub fn read_exif_data(path: &Path) -> Result<ExifData> {
    let file = File::open(path)
        .with_context(|| format!("could not open file for EXIF: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        Err(exif::Error::Io(err)) => {
            return Err(err).with_context(|| format!("could not read EXIF: {}", path.display()))
        }
        Err(_) => return Ok(ExifData::default()),
    };

    let date = find_field(&exif, &[Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime])
        .and_then(ascii_value)
        .and_then(|raw| parse_date(&raw));

    Ok(ExifData {
        iso: find_field(&exif, &[Tag::PhotographicSensitivity]).and_then(uint_value),
        exposure_time: find_field(&exif, &[Tag::ExposureTime])
            .map(display_value)
            .map(|v| v.replace('/', "_")),
        focal_length: find_field(&exif, &[Tag::FocalLength]).map(display_value),
        focal_length_35: find_field(&exif, &[Tag::FocalLengthIn35mmFilm]).and_then(uint_value),
        f_number: find_field(&exif, &[Tag::FNumber]).map(display_value),
        width: find_field(&exif, &[Tag::PixelXDimension, Tag::ImageWidth]).and_then(uint_value),
        height: find_field(&exif, &[Tag::PixelYDimension, Tag::ImageLength])
            .and_then(uint_value),
        make: find_field(&exif, &[Tag::Make]).and_then(ascii_value),
        model: find_field(&exif, &[Tag::Model]).and_then(ascii_value),
        lens: find_field(&exif, &[Tag::LensModel]).and_then(ascii_value),
        software: find_field(&exif, &[Tag::Software]).and_then(ascii_value),
        latitude: gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S'),
        longitude: gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W'),
        date,
    })
}

fn find_field<'a>(exif: &'a Exif, tags: &[Tag]) -> Option<&'a Field> {
    tags.iter().find_map(|tag| exif.get_field(*tag, In::PRIMARY))
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn ascii_value(field: &Field) -> Option<String> {
    match field.value {
        Value::Ascii(ref parts) => parts
            .first()
            .and_then(|bytes| normalize(String::from_utf8_lossy(bytes).into_owned())),
        _ => normalize(display_value(field)),
    }
}

fn uint_value(field: &Field) -> Option<String> {
    field.value.get_uint(0).map(|v| v.to_string())
}

fn display_value(field: &Field) -> String {
    field.display_value().to_string()
}

fn gps_coordinate(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: char) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    if parts.len() < 3 {
        return None;
    }

    let mut decimal = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;
    let negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(ascii_value)
        .map(|r| r.starts_with(negative_ref))
        .unwrap_or(false);
    if negative {
        decimal = -decimal;
    }

    Some(format!("{decimal:.6}"))
}

pub(crate) fn parse_date(input: &str) -> Option<DateTime<Local>> {
    let normalized = input.trim();

    let candidates = [
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y:%m:%d %H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
    ];

    for fmt in candidates {
        if let Ok(dt) = DateTime::parse_from_str(normalized, fmt) {
            return Some(dt.with_timezone(&Local));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            if let Some(local) = Local.from_local_datetime(&naive).single() {
                return Some(local);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_date_accepts_exif_layout() {
        let date = parse_date("2023:11:05 08:09:10").expect("must parse");
        assert_eq!(date.year(), 2023);
        assert_eq!(date.month(), 11);
        assert_eq!(date.hour(), 8);
        assert_eq!(date.second(), 10);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn non_image_yields_empty_exif() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("notes.txt");
        fs::write(&path, b"plain text, no exif here").expect("write");

        let data = read_exif_data(&path).expect("non-image must not fail");
        assert!(data.make.is_none());
        assert!(data.date.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempdir().expect("tempdir");
        assert!(read_exif_data(&temp.path().join("absent.jpg")).is_err());
    }
}
