use crate::models::{ObservationRecord, WarehouseRow};

/// Provider record → warehouse row. Absent fields stay null; values pass through untouched.
pub fn observation_to_row(rec: &ObservationRecord) -> WarehouseRow {
    WarehouseRow {
        date: rec.datetime.clone(),
        clouds: rec.clouds.clone(),
        temperature: rec.temp.clone(),
        max_temp: rec.max_temp.clone(),
        min_temp: rec.min_temp.clone(),
        precipitation: rec.precip.clone(),
        snow: rec.snow.clone(),
        snow_depth: rec.snow_depth.clone(),
        wind_speed: rec.wind_spd.clone(),
    }
}

pub fn observations_to_rows(records: &[ObservationRecord]) -> Vec<WarehouseRow> {
    records.iter().map(observation_to_row).collect()
}
