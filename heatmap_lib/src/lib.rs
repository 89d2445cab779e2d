pub mod heatmap_params;
pub mod track_point;
pub mod track_table;
