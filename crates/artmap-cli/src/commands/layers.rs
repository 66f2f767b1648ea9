//! Layer management commands

use crate::cli::{CreateLayerArgs, LayersCommand};
use crate::errors::invalid_argument;
use crate::interactive::confirm_layer_delete;
use crate::output::OutputWriter;
use crate::output_types::LayerRow;
use crate::storage::Storage;
use anyhow::{Context, Result};
use artmap_core::models::InsertLayer;

pub async fn execute(command: LayersCommand, storage: &Storage, output: &OutputWriter) -> Result<()> {
    match command {
        LayersCommand::List => list(storage, output).await,
        LayersCommand::Get { id } => get(&id, storage, output).await,
        LayersCommand::Create(args) => create(args, storage, output).await,
        LayersCommand::Visible { id, visible } => set_visible(&id, visible, storage, output).await,
        LayersCommand::Delete { id, yes } => delete(&id, yes, storage, output).await,
    }
}

async fn list(storage: &Storage, output: &OutputWriter) -> Result<()> {
    let layers = storage.store.list_layers().await?;

    if output.is_json() {
        return output.result(&layers);
    }

    output.table(layers.iter().map(LayerRow::from).collect());
    Ok(())
}

async fn get(id: &str, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let Some(layer) = storage.store.get_layer(id).await? else {
        if output.is_json() {
            return output.result(serde_json::Value::Null);
        }
        output.info(format!("No layer '{}'", id));
        return Ok(());
    };

    if output.is_json() {
        return output.result(&layer);
    }

    output.section(format!("Layer {}", layer.id));
    output.kv("Name", &layer.name);
    output.kv("Artifacts", layer.artifact_count);
    output.kv("Visible", layer.visible);
    if let Some(description) = &layer.description {
        output.kv("Description", description);
    }
    if let Some(source) = &layer.source {
        output.kv("Source", source);
    }
    if let Some(style) = &layer.style {
        output.kv("Style", style);
    }
    Ok(())
}

fn insert_layer(args: CreateLayerArgs) -> Result<InsertLayer> {
    if args.id.trim().is_empty() {
        return Err(invalid_argument("layer id cannot be empty").into());
    }

    let style = args
        .style
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--style must be valid JSON")?;

    let name = args.name.unwrap_or_else(|| args.id.clone());
    let mut layer = InsertLayer::new(args.id, name);
    layer.description = args.description;
    layer.source = args.source;
    layer.visible = Some(!args.hidden);
    layer.style = style;
    Ok(layer)
}

async fn create(args: CreateLayerArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let layer = storage.store.create_layer(insert_layer(args)?).await?;

    if output.is_json() {
        return output.result(&layer);
    }

    output.success(format!("Layer '{}' saved ({} artifact(s))", layer.id, layer.artifact_count));
    Ok(())
}

async fn set_visible(id: &str, visible: bool, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let exists = storage.store.get_layer(id).await?.is_some();
    storage.store.set_layer_visible(id, visible).await?;

    if output.is_json() {
        return output.result(serde_json::json!({ "id": id, "visible": visible, "found": exists }));
    }

    if exists {
        output.success(format!("Layer '{}' is now {}", id, if visible { "visible" } else { "hidden" }));
    } else {
        output.warning(format!("No layer '{}'; nothing changed", id));
    }
    Ok(())
}

async fn delete(id: &str, yes: bool, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let count = storage.store.get_layer(id).await?.map(|l| l.artifact_count).unwrap_or(0);

    if !yes && !output.is_json() && !confirm_layer_delete(id, count)? {
        output.info("Aborted; pass --yes to delete without a prompt");
        return Ok(());
    }

    storage.store.delete_layer(id).await?;

    if output.is_json() {
        return output.result(serde_json::json!({ "id": id, "removed": count }));
    }

    output.success(format!("Deleted layer '{}' and {} artifact(s)", id, count));
    Ok(())
}
