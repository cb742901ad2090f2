use crate::error::Error;

/// Where a database's `recordLength` and `databaseSegment` come from, per
/// the edition family (§4.B of the specification this crate implements).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentSource {
    /// Fixed at a known constant; never read from the header.
    Fixed(u32),
    /// Read as 3 bytes little-endian from the header tail.
    FromHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub record_length: u8,
    pub segment: SegmentSource,
}

/// Tagged variant over every edition id this crate understands. Modeling
/// edition this way (rather than switching on a bare integer at every use
/// site) makes adding a new edition an exhaustive-match compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edition {
    Country,
    CityRev1,
    RegionRev1,
    Isp,
    Org,
    CityRev0,
    RegionRev0,
    Proxy,
    AsNum,
    NetSpeed,
    Domain,
    CountryV6,
    AsNumV6,
    IspV6,
    OrgV6,
    DomainV6,
    CityRev1V6,
    CityRev0V6,
    NetSpeedRev1,
    NetSpeedRev1V6,
}

use self::Edition::*;

impl Edition {
    /// Reconstructs the edition from a header byte, after the legacy
    /// `raw >= 106` rebasing (`raw - 105`) has already been applied.
    pub(crate) fn from_id(id: u8) -> Result<Edition, Error> {
        Ok(match id {
            1 => Country,
            2 => CityRev1,
            3 => RegionRev1,
            4 => Isp,
            5 => Org,
            6 => CityRev0,
            7 => RegionRev0,
            8 => Proxy,
            9 => AsNum,
            10 => NetSpeed,
            11 => Domain,
            12 => CountryV6,
            21 => AsNumV6,
            22 => IspV6,
            23 => OrgV6,
            24 => DomainV6,
            30 => CityRev1V6,
            31 => CityRev0V6,
            32 => NetSpeedRev1,
            33 => NetSpeedRev1V6,
            raw => return Err(Error::UnknownEdition { raw }),
        })
    }

    pub fn id(self) -> u8 {
        match self {
            Country => 1,
            CityRev1 => 2,
            RegionRev1 => 3,
            Isp => 4,
            Org => 5,
            CityRev0 => 6,
            RegionRev0 => 7,
            Proxy => 8,
            AsNum => 9,
            NetSpeed => 10,
            Domain => 11,
            CountryV6 => 12,
            AsNumV6 => 21,
            IspV6 => 22,
            OrgV6 => 23,
            DomainV6 => 24,
            CityRev1V6 => 30,
            CityRev0V6 => 31,
            NetSpeedRev1 => 32,
            NetSpeedRev1V6 => 33,
        }
    }

    pub(crate) fn layout(self) -> Layout {
        use crate::consts::{COUNTRY_BEGIN, STATE_BEGIN_REV0, STATE_BEGIN_REV1};

        match self {
            Country | CountryV6 | Proxy | NetSpeed => Layout {
                record_length: 3,
                segment: SegmentSource::Fixed(COUNTRY_BEGIN),
            },
            RegionRev0 => Layout {
                record_length: 3,
                segment: SegmentSource::Fixed(STATE_BEGIN_REV0),
            },
            RegionRev1 => Layout {
                record_length: 3,
                segment: SegmentSource::Fixed(STATE_BEGIN_REV1),
            },
            CityRev1 | CityRev0 | AsNum | NetSpeedRev1 | CityRev1V6 | CityRev0V6
            | NetSpeedRev1V6 | AsNumV6 => Layout {
                record_length: 3,
                segment: SegmentSource::FromHeader,
            },
            Isp | Org | Domain | IspV6 | OrgV6 | DomainV6 => Layout {
                record_length: 4,
                segment: SegmentSource::FromHeader,
            },
        }
    }

    /// True for editions whose leaf is a city/location record (§3).
    pub(crate) fn is_city(self) -> bool {
        matches!(self, CityRev1 | CityRev0 | CityRev1V6 | CityRev0V6)
    }

    /// True for editions whose leaf is a single NUL-terminated string
    /// (org, ISP, ASN, domain families).
    pub(crate) fn is_string_leaf(self) -> bool {
        matches!(self, Isp | Org | Domain | IspV6 | OrgV6 | DomainV6 | AsNum | AsNumV6)
    }

    /// True for the CITY_REV1 family, which carries a US-only DMA/area-code
    /// triple after the coordinates (§3, §9 ORQ-1).
    pub(crate) fn is_city_rev1(self) -> bool {
        matches!(self, CityRev1 | CityRev1V6)
    }

    /// True for editions that resolve directly to a country-table index
    /// rather than to a leaf record.
    pub(crate) fn is_country_only(self) -> bool {
        matches!(self, Country | CountryV6 | Proxy | NetSpeed)
    }

    pub(crate) fn is_region_rev0(self) -> bool {
        matches!(self, RegionRev0)
    }

    pub(crate) fn is_region_rev1(self) -> bool {
        matches!(self, RegionRev1)
    }

    /// True for editions whose keys are 16-byte IPv6 addresses.
    pub fn is_v6(self) -> bool {
        matches!(
            self,
            CountryV6 | AsNumV6 | IspV6 | OrgV6 | DomainV6 | CityRev1V6 | CityRev0V6 | NetSpeedRev1V6
        )
    }
}
