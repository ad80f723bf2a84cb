use rusttype::{Font, Scale};
use std::fs;
use std::io;
use std::path::Path;

pub(crate) struct FontConfig {
    pub font: Font<'static>,
    pub scale: Scale,
}

/// Title and body fonts. Text is only drawn when a TTF file is configured.
pub(crate) struct Fonts {
    pub title: FontConfig,
    pub regular: FontConfig,
    pub small: FontConfig,
}

impl Fonts {
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not a usable TrueType font", path.display()),
            )
        })?;

        Ok(Self {
            title: font_config(&font, 22.0),
            regular: font_config(&font, 18.0),
            small: font_config(&font, 15.0),
        })
    }
}

fn font_config(font: &Font<'static>, scale: f32) -> FontConfig {
    FontConfig {
        font: font.clone(),
        scale: Scale::uniform(scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_rejects_missing_and_invalid_fonts() {
        assert!(Fonts::load("/nonexistent/font.ttf").is_err());

        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), b"not a font").unwrap();
        let err = Fonts::load(file.path()).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
