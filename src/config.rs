use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Grid router inputs for one family of edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteParams {
    pub grid_size: f32,
    pub padding: f32,
    pub stub_length: f32,
}

impl RouteParams {
    pub const fn new(grid_size: f32, padding: f32, stub_length: f32) -> Self {
        Self {
            grid_size,
            padding,
            stub_length,
        }
    }
}

impl Default for RouteParams {
    fn default() -> Self {
        Self::new(14.0, 14.0, 14.0)
    }
}

/// A* cost model. Turns must stay dearer than straight steps and blocked
/// neighbours dearer than open ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterTuning {
    pub margin: f32,
    pub proximity_penalty: f32,
    pub turn_penalty: f32,
    pub uturn_penalty: f32,
    pub start_direction_penalty: f32,
    pub max_expansions: usize,
}

impl Default for RouterTuning {
    fn default() -> Self {
        Self {
            margin: 80.0,
            proximity_penalty: 0.14,
            turn_penalty: 0.9,
            uturn_penalty: 0.6,
            start_direction_penalty: 0.45,
            max_expansions: 250_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub inset: f32,
    pub misfacing_penalty: f32,
    pub same_side_penalty: f32,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            inset: 12.0,
            misfacing_penalty: 180.0,
            same_side_penalty: 28.0,
        }
    }
}

/// Per-character advance used by the width heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharWidths {
    pub latin: f32,
    pub wide: f32,
    pub space: f32,
}

impl Default for CharWidths {
    fn default() -> Self {
        Self {
            latin: 7.2,
            wide: 8.7,
            space: 4.0,
        }
    }
}

/// Label scoring. Node overlap must outweigh label overlap, which must
/// outweigh path overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub node_overlap_penalty: f32,
    pub label_overlap_penalty: f32,
    pub path_overlap_penalty: f32,
    pub distance_weight: f32,
    pub node_clearance: f32,
    pub label_clearance: f32,
    pub path_clearance: f32,
    pub offset_above: f32,
    pub offset_below: f32,
    pub offset_side: f32,
    pub fallback_offset: f32,
    pub box_padding: f32,
    pub box_height: f32,
    pub char_widths: CharWidths,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            node_overlap_penalty: 900.0,
            label_overlap_penalty: 700.0,
            path_overlap_penalty: 280.0,
            distance_weight: 0.08,
            node_clearance: 4.0,
            label_clearance: 3.0,
            path_clearance: 2.0,
            offset_above: 14.0,
            offset_below: 18.0,
            offset_side: 14.0,
            fallback_offset: 18.0,
            box_padding: 12.0,
            box_height: 18.0,
            char_widths: CharWidths {
                latin: 7.2,
                wide: 8.8,
                space: 7.2,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UseCaseConfig {
    pub actor_x: f32,
    pub actor_start_y: f32,
    pub actor_spacing: f32,
    pub actor_width: f32,
    pub actor_height: f32,
    pub use_case_x: f32,
    pub use_case_start_y: f32,
    pub use_case_spacing: f32,
    pub use_case_width: f32,
    pub use_case_height: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub margin: f32,
    pub route: RouteParams,
}

impl Default for UseCaseConfig {
    fn default() -> Self {
        Self {
            actor_x: 120.0,
            actor_start_y: 120.0,
            actor_spacing: 130.0,
            actor_width: 48.0,
            actor_height: 92.0,
            use_case_x: 440.0,
            use_case_start_y: 110.0,
            use_case_spacing: 110.0,
            use_case_width: 180.0,
            use_case_height: 60.0,
            min_width: 860.0,
            min_height: 360.0,
            margin: 80.0,
            route: RouteParams::new(14.0, 12.0, 12.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub participant_start_x: f32,
    pub participant_gap: f32,
    pub header_y: f32,
    pub header_width: f32,
    pub header_height: f32,
    pub message_start_y: f32,
    pub message_gap: f32,
    pub lifeline_clearance: f32,
    pub self_loop_width: f32,
    pub self_loop_height: f32,
    pub self_label_gap: f32,
    pub self_label_drop: f32,
    pub label_lift: f32,
    pub activation_width: f32,
    pub activation_lead: f32,
    pub activation_tail: f32,
    pub activation_min_height: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub right_margin: f32,
    pub bottom_margin: f32,
    pub lifeline_bottom_margin: f32,
    pub route: RouteParams,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            participant_start_x: 120.0,
            participant_gap: 180.0,
            header_y: 44.0,
            header_width: 120.0,
            header_height: 40.0,
            message_start_y: 140.0,
            message_gap: 70.0,
            lifeline_clearance: 8.0,
            self_loop_width: 54.0,
            self_loop_height: 30.0,
            self_label_gap: 4.0,
            self_label_drop: 12.0,
            label_lift: 8.0,
            activation_width: 16.0,
            activation_lead: 18.0,
            activation_tail: 40.0,
            activation_min_height: 28.0,
            min_width: 900.0,
            min_height: 420.0,
            right_margin: 180.0,
            bottom_margin: 120.0,
            lifeline_bottom_margin: 40.0,
            route: RouteParams::new(12.0, 6.0, 10.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassConfig {
    pub start_x: f32,
    pub start_y: f32,
    pub grid_start_y: f32,
    pub horizontal_gap: f32,
    pub vertical_gap: f32,
    pub grid_vertical_gap: f32,
    pub grid_column_width: f32,
    pub min_width: f32,
    pub max_width: f32,
    pub min_text_width: f32,
    pub text_padding: f32,
    pub header_height: f32,
    pub row_height: f32,
    pub footer_height: f32,
    pub divider_offset: f32,
    pub row_baseline: f32,
    pub title_baseline: f32,
    pub text_inset: f32,
    pub min_level_width: f32,
    pub min_canvas_width: f32,
    pub min_canvas_height: f32,
    pub canvas_margin: f32,
    pub char_widths: CharWidths,
    pub route: RouteParams,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            start_x: 90.0,
            start_y: 90.0,
            grid_start_y: 100.0,
            horizontal_gap: 90.0,
            vertical_gap: 120.0,
            grid_vertical_gap: 90.0,
            grid_column_width: 320.0,
            min_width: 250.0,
            max_width: 320.0,
            min_text_width: 120.0,
            text_padding: 34.0,
            header_height: 48.0,
            row_height: 24.0,
            footer_height: 8.0,
            divider_offset: 42.0,
            row_baseline: 18.0,
            title_baseline: 27.0,
            text_inset: 12.0,
            min_level_width: 500.0,
            min_canvas_width: 860.0,
            min_canvas_height: 420.0,
            canvas_margin: 120.0,
            char_widths: CharWidths::default(),
            route: RouteParams::new(14.0, 10.0, 14.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub start_x: f32,
    pub start_y: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    pub state_width: f32,
    pub state_height: f32,
    pub pseudo_start_x: f32,
    pub pseudo_y: f32,
    pub start_radius: f32,
    pub end_radius: f32,
    pub end_gap: f32,
    pub min_rightmost: f32,
    pub lane_base: f32,
    pub lane_step: f32,
    pub path_clearance: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub right_margin: f32,
    pub bottom_margin: f32,
    pub route: RouteParams,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            start_x: 150.0,
            start_y: 140.0,
            cell_width: 230.0,
            cell_height: 150.0,
            state_width: 140.0,
            state_height: 60.0,
            pseudo_start_x: 70.0,
            pseudo_y: 150.0,
            start_radius: 10.0,
            end_radius: 12.0,
            end_gap: 120.0,
            min_rightmost: 620.0,
            lane_base: 12.0,
            lane_step: 10.0,
            path_clearance: 4.0,
            min_width: 900.0,
            min_height: 460.0,
            right_margin: 140.0,
            bottom_margin: 120.0,
            route: RouteParams::new(12.0, 10.0, 12.0),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub usecase: UseCaseConfig,
    pub sequence: SequenceConfig,
    pub class: ClassConfig,
    pub state: StateConfig,
    pub router: RouterTuning,
    pub anchor: AnchorConfig,
    pub label: LabelConfig,
}

/// Loads a layout config, keeping defaults for every key the file omits.
///
/// Files ending in `.json5` are read as JSON5, everything else as JSON.
pub fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let is_json5 = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json5"))
        .unwrap_or(false);
    let config = if is_json5 {
        json5::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };
    Ok(config)
}
