pub mod grading;
pub mod loaders;
pub mod offer;

pub use grading::{sort_results, GradingResult, Verdict};
pub use loaders::{load_all_json_files, load_json_to_offer};
pub use offer::{ImageDetail, ImageSource, PackageSummary, StructuredOffer, CURATED_STATUS};
