use serde::{Deserialize, Serialize};

/// Piece extraction from a scene photo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterParams {
    /// Radius of the box blur applied to the grayscale scene (0 disables it).
    pub blur_radius: u32,
    /// Gray levels strictly above this value count as foreground.
    ///
    /// The default of `0` assumes pieces photographed on a black backdrop.
    pub foreground_threshold: u8,
    /// Contours whose bounding box is narrower or shorter than this many
    /// pixels are dropped as noise.
    pub min_extent: u32,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        Self {
            blur_radius: 1,
            foreground_threshold: 0,
            min_extent: 2,
        }
    }
}

/// Polygon reduction and edge classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeModelParams {
    /// Douglas-Peucker tolerance in pixels.
    pub polygon_tolerance: f64,
    /// Bounding-box height/width ratio below which a normalized edge is flat.
    pub flatness_threshold: f64,
}

impl Default for EdgeModelParams {
    fn default() -> Self {
        Self {
            polygon_tolerance: 1.0,
            flatness_threshold: 0.05,
        }
    }
}

/// Greedy perimeter matching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderMatchParams {
    /// Pairs whose cost exceeds this value are never connected.
    ///
    /// `None` accepts any finite cost.
    pub cost_ceiling: Option<f64>,
    /// Refuse pairs whose pieces already share a group, except for the
    /// connection that closes the perimeter.
    pub cycle_guard: bool,
}

impl Default for BorderMatchParams {
    fn default() -> Self {
        Self {
            cost_ceiling: None,
            cycle_guard: true,
        }
    }
}

/// Output canvas layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeParams {
    /// Side of one grid cell in canvas pixels.
    pub cell_pitch: u32,
    /// Border added around the whole grid, in pixels.
    pub padding: u32,
    /// Canvas fill colour.
    pub background: [u8; 3],
}

impl Default for ComposeParams {
    fn default() -> Self {
        Self {
            cell_pitch: 400,
            padding: 32,
            background: [0, 0, 0],
        }
    }
}

/// All assembly stages in one place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyParams {
    pub segmenter: SegmenterParams,
    pub edges: EdgeModelParams,
    pub matcher: BorderMatchParams,
    pub compose: ComposeParams,
}
