use std::fmt;

/// Oldest product release the windowed queries run on (`ROW_NUMBER()`
/// first shipped with SQL Server 2005, internal version 9).
pub const MINIMUM_PRODUCT_YEAR: u16 = 2005;
pub const MINIMUM_MAJOR_VERSION: u32 = 9;

/// Parsed form of the `@@VERSION` banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    pub banner: String,
    pub product_year: Option<u16>,
    pub major: Option<u32>,
}

impl ServerVersion {
    /// Accepts banners such as
    /// `Microsoft SQL Server 2019 (RTM-CU18) (KB5017593) - 15.0.4261.1 (X64) ...`
    /// or `Microsoft SQL Azure (RTM) - 12.0.2000.8 ...`.
    pub fn parse(banner: &str) -> Self {
        let tokens: Vec<&str> = banner.split_whitespace().collect();

        let product_year = tokens
            .windows(4)
            .find(|w| w[0] == "Microsoft" && w[1] == "SQL" && w[2] == "Server")
            .and_then(|w| {
                let year = w[3];
                (year.len() == 4 && year.starts_with("20"))
                    .then(|| year.parse::<u16>().ok())
                    .flatten()
            });

        let major = tokens
            .windows(2)
            .find(|w| w[0] == "-" && w[1].contains('.'))
            .and_then(|w| w[1].split('.').next())
            .and_then(|m| m.parse::<u32>().ok());

        ServerVersion {
            banner: banner.trim().to_string(),
            product_year,
            major,
        }
    }

    pub fn is_supported(&self) -> bool {
        match (self.product_year, self.major) {
            (Some(year), _) => year >= MINIMUM_PRODUCT_YEAR,
            (None, Some(major)) => major >= MINIMUM_MAJOR_VERSION,
            (None, None) => false,
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.product_year, self.major) {
            (Some(year), Some(major)) => write!(f, "SQL Server {year} ({major}.x)"),
            (Some(year), None) => write!(f, "SQL Server {year}"),
            (None, Some(major)) => write!(f, "SQL Server {major}.x"),
            (None, None) => write!(f, "{}", self.banner.lines().next().unwrap_or_default()),
        }
    }
}
