use std::num::NonZeroU16;

/// A hyperlink id in `[1, 65535]`. Zero means "no hyperlink" and is
/// represented as `Option<HyperlinkId>` rather than as a value of this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HyperlinkId(NonZeroU16);

impl HyperlinkId {
    /// Builds a `HyperlinkId`, returning `None` for `0`.
    pub fn new(raw: u16) -> Option<Self> {
        NonZeroU16::new(raw).map(Self)
    }

    pub fn get(self) -> u16 {
        self.0.get()
    }
}

impl From<HyperlinkId> for u16 {
    fn from(id: HyperlinkId) -> u16 {
        id.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_valid_id() {
        assert!(HyperlinkId::new(0).is_none());
    }

    #[test]
    fn round_trips_through_u16() {
        let id = HyperlinkId::new(42).unwrap();
        assert_eq!(u16::from(id), 42);
    }
}
