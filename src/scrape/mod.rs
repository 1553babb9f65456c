pub mod extract;
pub mod normalize;
pub mod rank;
pub mod reduce;
pub mod resolver;
pub mod snapshot;

pub use extract::{scrape_page, ScrapeOutcome};
pub use snapshot::{Heading, Logo, LogoKind, NavItem, OriginKind, PageSnapshot, VisualCandidate};
