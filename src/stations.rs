//! Station registry for the Wildcat Creek / Tippecanoe River comparison.
//!
//! Single source of truth for the two gauges in the report: the abbreviation
//! used in the `Station` column of the metrics tables, the full river name
//! shown in chart legends, and the raw USGS discharge download for each.
//! Registry order is plot order (first station red, second blue).

/// Metadata for a single USGS gauge station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    /// Abbreviation stored in the metrics CSV `Station` column.
    pub abbreviation: &'static str,
    /// Full river name used in chart legends.
    pub name: &'static str,
    /// 8-digit USGS site number.
    pub site_no: &'static str,
    /// Raw daily discharge file, relative to the data directory.
    pub raw_file: &'static str,
}

pub static STATION_REGISTRY: &[Station] = &[
    Station {
        abbreviation: "Wildcat",
        name: "Wildcat Creek",
        site_no: "03335000",
        raw_file: "WildcatCreek_Discharge_03335000_19540601-20200315.txt",
    },
    Station {
        abbreviation: "Tippe",
        name: "Tippecanoe River",
        site_no: "03331500",
        raw_file: "TippecanoeRiver_Discharge_03331500_19431001-20200315.txt",
    },
];

/// Looks up a station by its metrics-table abbreviation.
pub fn find_station(abbreviation: &str) -> Option<&'static Station> {
    STATION_REGISTRY
        .iter()
        .find(|s| s.abbreviation == abbreviation)
}
