//! Base-address/region-mask predicate and slave-relative address translation.

/// Returns the all-ones mask for an address of `width` bits.
///
/// Widths of 64 or more saturate to `u64::MAX`; a width of zero yields zero.
#[must_use]
pub const fn address_width_mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1_u64 << width) - 1
    }
}

/// Address window owned by the downstream responder.
///
/// An address is in the window when the bits selected by `mask` equal the
/// same bits of `base`. The remaining bits address the responder locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AddressRegion {
    base: u64,
    mask: u64,
    width_mask: u64,
}

impl AddressRegion {
    /// Creates a region for addresses `address_width` bits wide.
    #[must_use]
    pub const fn new(base: u64, mask: u64, address_width: u32) -> Self {
        let width_mask = address_width_mask(address_width);
        Self {
            base: base & width_mask,
            mask: mask & width_mask,
            width_mask,
        }
    }

    /// Configured base address.
    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Configured region mask.
    #[must_use]
    pub const fn mask(&self) -> u64 {
        self.mask
    }

    /// Truncates `addr` to the configured address width.
    #[must_use]
    pub const fn truncate(&self, addr: u64) -> u64 {
        addr & self.width_mask
    }

    /// Returns `true` when `addr` falls inside the window.
    #[must_use]
    pub const fn contains(&self, addr: u64) -> bool {
        (self.truncate(addr) & self.mask) == (self.base & self.mask)
    }

    /// Translates `addr` to the responder's local window by clearing the
    /// region-selecting bits.
    #[must_use]
    pub const fn localize(&self, addr: u64) -> u64 {
        self.truncate(addr) & !self.mask
    }

    /// Highest local address plus one, saturating at `u64::MAX`.
    #[must_use]
    pub const fn window_bytes(&self) -> u64 {
        (self.width_mask & !self.mask).saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{address_width_mask, AddressRegion};

    #[test]
    fn width_mask_covers_edge_widths() {
        assert_eq!(address_width_mask(0), 0);
        assert_eq!(address_width_mask(1), 0b1);
        assert_eq!(address_width_mask(16), 0xFFFF);
        assert_eq!(address_width_mask(32), 0xFFFF_FFFF);
        assert_eq!(address_width_mask(64), u64::MAX);
    }

    #[test]
    fn membership_compares_only_masked_bits() {
        let region = AddressRegion::new(0x1000, 0xFF00, 32);
        assert!(region.contains(0x1000));
        assert!(region.contains(0x1050));
        assert!(region.contains(0x10FF));
        assert!(!region.contains(0x2050));
        assert!(!region.contains(0x0F50));
    }

    #[test]
    fn localize_strips_region_bits() {
        let region = AddressRegion::new(0x1000, 0xFF00, 16);
        assert_eq!(region.localize(0x1050), 0x0050);
        assert_eq!(region.localize(0x10FF), 0x00FF);
    }

    #[test]
    fn addresses_are_truncated_to_configured_width() {
        let region = AddressRegion::new(0x1000, 0xFF00, 16);
        assert!(region.contains(0xABCD_1050));
        assert_eq!(region.localize(0xABCD_1050), 0x0050);
    }

    #[test]
    fn zero_mask_admits_every_address() {
        let region = AddressRegion::new(0, 0, 32);
        assert!(region.contains(0));
        assert!(region.contains(0xFFFF_FFFF));
        assert_eq!(region.localize(0x1234_5678), 0x1234_5678);
    }

    #[test]
    fn window_size_spans_highest_local_address() {
        assert_eq!(AddressRegion::new(0x1000, 0xFF00, 16).window_bytes(), 256);
        assert_eq!(
            AddressRegion::new(0x4000_0000, 0xFFFF_F000, 32).window_bytes(),
            4096
        );
        assert_eq!(AddressRegion::new(0, 0x0F0F, 16).window_bytes(), 0xF0F1);
        assert_eq!(AddressRegion::new(0, 0, 64).window_bytes(), u64::MAX);
    }
}
