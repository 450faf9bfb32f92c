pub mod background;
pub mod bounded_history;
pub mod contour_finder;
pub mod edges;
pub mod frame;
pub mod morphology;
pub mod motion_extractor;
pub mod palette;
pub mod particle;
pub mod raster;
pub mod trails;
