//! Config command implementation

use crate::output::OutputWriter;
use crate::output_types::ConfigRow;
use anyhow::Result;
use artmap_core::config::LayeredConfig;

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        let data: serde_json::Map<String, serde_json::Value> = rows
            .iter()
            .map(|row| {
                (
                    row.key.clone(),
                    serde_json::json!({ "value": row.value, "source": row.source }),
                )
            })
            .collect();
        return output.result(data);
    }

    output.section("Configuration");
    output.table(rows);
    Ok(())
}
