//! Decoder selection from a resource name.

/// Which decode path a resource takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Targa images, including colour-mapped (paletted) ones.
    Indexed,
    /// Anything else; the concrete format is sniffed from the bytes.
    General,
}

impl ImageFormat {
    /// Suffix reserved for the indexed decode path.
    pub const INDEXED_SUFFIX: &'static str = ".tga";

    /// Resolve the decode path once, at the call boundary.
    pub fn from_resource_name(name: &str) -> Self {
        let suffix = Self::INDEXED_SUFFIX;
        let is_indexed = name.len() >= suffix.len()
            && name.is_char_boundary(name.len() - suffix.len())
            && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix);
        if is_indexed {
            ImageFormat::Indexed
        } else {
            ImageFormat::General
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tga_suffix_selects_indexed_path() {
        assert_eq!(ImageFormat::from_resource_name("tile.tga"), ImageFormat::Indexed);
        assert_eq!(
            ImageFormat::from_resource_name("res/sprites/HERO.TGA"),
            ImageFormat::Indexed
        );
    }

    #[test]
    fn everything_else_is_general() {
        for name in ["tile.png", "photo.jpg", "tga", "tile.tga.png", "", "ünïcödé"] {
            assert_eq!(ImageFormat::from_resource_name(name), ImageFormat::General, "{name}");
        }
    }
}
