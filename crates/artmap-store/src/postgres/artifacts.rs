use async_trait::async_trait;
use artmap_core::error::Result;
use artmap_core::models::{
    AggregateResult, Artifact, ArtifactId, Bounds, CircleSelection, InsertArtifact, InsertLayer,
    Layer, LayerFilter, ViewportResponse,
};
use artmap_geo::{
    grid_size, prefilter_bounds, tally_categories, within_circle, GridCell, CLUSTERING_MAX_ZOOM,
    CLUSTER_THRESHOLD,
};
use sqlx::types::Json;
use sqlx::{PgConnection, Row};

use super::rows::{
    artifact_from_row, count_from_db, is_empty_bounds, layer_from_row, layer_param, limit_to_db,
    location_param, singles_budget, summarize_cells, viewport_from_summary, CellRow,
    ARTIFACT_COLUMNS, LAYER_COLUMNS,
};
use super::{map_sqlx_error, PostgresStore};
use crate::ports::ArtifactStore;

/// Shared spatial + layer predicate; binds $1..$4 as west, south, east, north and $5 as layers.
///
/// `&&` compares float4 boxes rounded outward, so it only drives the GiST index;
/// the double precision ranges decide membership on closed f64 intervals.
const IN_BOUNDS: &str = "location && ST_MakeEnvelope($1, $2, $3, $4, 4326) \
     AND lng BETWEEN $1 AND $3 AND lat BETWEEN $2 AND $4 \
     AND ($5::text[] IS NULL OR layer = ANY($5))";

/// Viewport reads run several statements that must agree on `total`
const VIEWPORT_SNAPSHOT: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

impl PostgresStore {
    async fn fetch_in_bounds(
        &self,
        operation: &'static str,
        bounds: &Bounds,
        layers: &LayerFilter,
    ) -> Result<Vec<Artifact>> {
        if is_empty_bounds(bounds) {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {} FROM artifacts WHERE {}", ARTIFACT_COLUMNS, IN_BOUNDS);
        let rows = sqlx::query(&sql)
            .bind(bounds.west)
            .bind(bounds.south)
            .bind(bounds.east)
            .bind(bounds.north)
            .bind(layer_param(layers))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error(operation))?;

        rows.iter().map(artifact_from_row).collect()
    }
}

async fn count_in_bounds(
    conn: &mut PgConnection,
    bounds: &Bounds,
    layers: &LayerFilter,
) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM artifacts WHERE {}", IN_BOUNDS);
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(bounds.west)
        .bind(bounds.south)
        .bind(bounds.east)
        .bind(bounds.north)
        .bind(layer_param(layers))
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error("get_viewport_data"))?;

    Ok(count_from_db(count))
}

/// Every artifact in bounds as a single, ordered by id
async fn viewport_unclustered(
    conn: &mut PgConnection,
    bounds: &Bounds,
    limit: usize,
    layers: &LayerFilter,
) -> Result<ViewportResponse> {
    let total = count_in_bounds(&mut *conn, bounds, layers).await?;

    let sql = format!(
        "SELECT {} FROM artifacts WHERE {} ORDER BY id LIMIT $6",
        ARTIFACT_COLUMNS, IN_BOUNDS
    );
    let rows = sqlx::query(&sql)
        .bind(bounds.west)
        .bind(bounds.south)
        .bind(bounds.east)
        .bind(bounds.north)
        .bind(layer_param(layers))
        .bind(limit_to_db(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error("get_viewport_data"))?;

    let singles = rows.iter().map(artifact_from_row).collect::<Result<Vec<_>>>()?;
    Ok(ViewportResponse { clusters: Vec::new(), singles, total, truncated: total > limit })
}

/// Grid aggregation in SQL: `GROUP BY floor(lng / g), floor(lat / g)`
async fn viewport_clustered(
    conn: &mut PgConnection,
    bounds: &Bounds,
    zoom: u8,
    limit: usize,
    layers: &LayerFilter,
) -> Result<ViewportResponse> {
    let grid = grid_size(zoom);

    let sql = format!(
        "SELECT floor(lng / $6)::bigint AS cx, floor(lat / $6)::bigint AS cy, \
                COUNT(*) AS n, AVG(lat) AS avg_lat, AVG(lng) AS avg_lng \
         FROM artifacts WHERE {} \
         GROUP BY cx, cy ORDER BY cx, cy",
        IN_BOUNDS
    );
    let rows = sqlx::query(&sql)
        .bind(bounds.west)
        .bind(bounds.south)
        .bind(bounds.east)
        .bind(bounds.north)
        .bind(layer_param(layers))
        .bind(grid)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error("get_viewport_data"))?;

    let cells = rows
        .iter()
        .map(|row| -> std::result::Result<CellRow, sqlx::Error> {
            Ok(CellRow {
                cell: GridCell { x: row.try_get("cx")?, y: row.try_get("cy")? },
                count: count_from_db(row.try_get("n")?),
                lat: row.try_get("avg_lat")?,
                lng: row.try_get("avg_lng")?,
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(map_sqlx_error("get_viewport_data"))?;

    let summary = summarize_cells(cells);
    tracing::debug!(
        zoom,
        grid_size = grid,
        candidates = summary.total,
        clusters = summary.clusters.len(),
        "Clustering viewport"
    );

    let budget = singles_budget(&summary, limit);
    let singles = if budget == 0 {
        Vec::new()
    } else {
        let sql = format!(
            "SELECT {cols} FROM ( \
                 SELECT {cols}, floor(lng / $6)::bigint AS cx, floor(lat / $6)::bigint AS cy, \
                        COUNT(*) OVER (PARTITION BY floor(lng / $6), floor(lat / $6)) AS n \
                 FROM artifacts WHERE {pred} \
             ) cells \
             WHERE n <= $7 ORDER BY cx, cy, id LIMIT $8",
            cols = ARTIFACT_COLUMNS,
            pred = IN_BOUNDS
        );
        let rows = sqlx::query(&sql)
            .bind(bounds.west)
            .bind(bounds.south)
            .bind(bounds.east)
            .bind(bounds.north)
            .bind(layer_param(layers))
            .bind(grid)
            .bind(limit_to_db(CLUSTER_THRESHOLD))
            .bind(limit_to_db(budget))
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error("get_viewport_data"))?;

        rows.iter().map(artifact_from_row).collect::<Result<Vec<_>>>()?
    };

    Ok(viewport_from_summary(summary, singles, limit))
}

/// Insert one artifact and bump its layer counter, creating the layer if needed
async fn insert_artifact(conn: &mut PgConnection, artifact: &Artifact) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO layers (id, name, artifact_count, visible)
        VALUES ($1, $1, 1, TRUE)
        ON CONFLICT (id) DO UPDATE SET artifact_count = layers.artifact_count + 1
        "#,
    )
    .bind(&artifact.layer)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error("create"))?;

    let (x, y) = location_param(artifact.lat, artifact.lng);
    sqlx::query(
        r#"
        INSERT INTO artifacts (id, name, category, layer, lat, lng, location, description, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, ST_SetSRID(ST_MakePoint($7::float8, $8::float8), 4326), $9, $10, $11)
        "#,
    )
    .bind(artifact.id.0)
    .bind(&artifact.name)
    .bind(&artifact.category)
    .bind(&artifact.layer)
    .bind(artifact.lat)
    .bind(artifact.lng)
    .bind(x)
    .bind(y)
    .bind(&artifact.description)
    .bind(artifact.metadata.as_ref().map(Json))
    .bind(artifact.created_at)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error("create"))?;

    Ok(())
}

#[async_trait]
impl ArtifactStore for PostgresStore {
    async fn create(&self, artifact: InsertArtifact) -> Result<Artifact> {
        let artifact = artifact.into_artifact(ArtifactId::new());

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error("create"))?;
        insert_artifact(&mut *tx, &artifact).await?;
        tx.commit().await.map_err(map_sqlx_error("create"))?;

        Ok(artifact)
    }

    async fn create_many(&self, artifacts: Vec<InsertArtifact>) -> Result<Vec<Artifact>> {
        if artifacts.is_empty() {
            return Ok(Vec::new());
        }

        let created: Vec<Artifact> =
            artifacts.into_iter().map(|a| a.into_artifact(ArtifactId::new())).collect();

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error("create_many"))?;
        for artifact in &created {
            insert_artifact(&mut *tx, artifact).await?;
        }
        tx.commit().await.map_err(map_sqlx_error("create_many"))?;

        tracing::debug!(count = created.len(), "Inserted artifact batch");
        Ok(created)
    }

    async fn get(&self, id: ArtifactId) -> Result<Option<Artifact>> {
        let sql = format!("SELECT {} FROM artifacts WHERE id = $1", ARTIFACT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error("get"))?;

        row.as_ref().map(artifact_from_row).transpose()
    }

    async fn get_all(&self, layers: &LayerFilter) -> Result<Vec<Artifact>> {
        let sql = format!(
            "SELECT {} FROM artifacts WHERE ($1::text[] IS NULL OR layer = ANY($1)) \
             ORDER BY created_at, id",
            ARTIFACT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(layer_param(layers))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error("get_all"))?;

        rows.iter().map(artifact_from_row).collect()
    }

    async fn get_in_bounds(&self, bounds: &Bounds, layers: &LayerFilter) -> Result<Vec<Artifact>> {
        self.fetch_in_bounds("get_in_bounds", bounds, layers).await
    }

    async fn get_in_circle(
        &self,
        circle: &CircleSelection,
        layers: &LayerFilter,
    ) -> Result<Vec<Artifact>> {
        // Index-assisted box in SQL, exact great-circle test in process
        let candidates =
            self.fetch_in_bounds("get_in_circle", &prefilter_bounds(circle), layers).await?;
        let candidate_count = candidates.len();

        let matches: Vec<Artifact> =
            candidates.into_iter().filter(|a| within_circle(circle, a.lat, a.lng)).collect();

        tracing::debug!(
            radius = circle.radius,
            candidates = candidate_count,
            matches = matches.len(),
            "Circle query"
        );
        Ok(matches)
    }

    async fn aggregate(
        &self,
        circle: &CircleSelection,
        layers: &LayerFilter,
    ) -> Result<AggregateResult> {
        let matches = self.get_in_circle(circle, layers).await?;
        Ok(tally_categories(matches))
    }

    async fn get_viewport_data(
        &self,
        bounds: &Bounds,
        zoom: u8,
        limit: usize,
        layers: &LayerFilter,
    ) -> Result<ViewportResponse> {
        if is_empty_bounds(bounds) {
            return Ok(ViewportResponse::default());
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error("get_viewport_data"))?;
        sqlx::query(VIEWPORT_SNAPSHOT)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error("get_viewport_data"))?;

        let response = if zoom >= CLUSTERING_MAX_ZOOM {
            viewport_unclustered(&mut *tx, bounds, limit, layers).await?
        } else {
            viewport_clustered(&mut *tx, bounds, zoom, limit, layers).await?
        };

        tx.commit().await.map_err(map_sqlx_error("get_viewport_data"))?;
        Ok(response)
    }

    async fn count(&self, layers: &LayerFilter) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM artifacts WHERE ($1::text[] IS NULL OR layer = ANY($1))",
        )
        .bind(layer_param(layers))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error("count"))?;

        Ok(count_from_db(count))
    }

    async fn list_layers(&self) -> Result<Vec<Layer>> {
        let sql = format!("SELECT {} FROM layers ORDER BY id COLLATE \"C\"", LAYER_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error("list_layers"))?;

        rows.iter().map(layer_from_row).collect()
    }

    async fn get_layer(&self, id: &str) -> Result<Option<Layer>> {
        let sql = format!("SELECT {} FROM layers WHERE id = $1", LAYER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error("get_layer"))?;

        row.as_ref().map(layer_from_row).transpose()
    }

    async fn create_layer(&self, layer: InsertLayer) -> Result<Layer> {
        let sql = format!(
            r#"
            INSERT INTO layers (id, name, description, source, visible, style)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                source = EXCLUDED.source,
                visible = EXCLUDED.visible,
                style = EXCLUDED.style
            RETURNING {}
            "#,
            LAYER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&layer.id)
            .bind(&layer.name)
            .bind(&layer.description)
            .bind(&layer.source)
            .bind(layer.visible.unwrap_or(true))
            .bind(&layer.style)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error("create_layer"))?;

        layer_from_row(&row)
    }

    async fn set_layer_visible(&self, id: &str, visible: bool) -> Result<()> {
        sqlx::query("UPDATE layers SET visible = $2 WHERE id = $1")
            .bind(id)
            .bind(visible)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error("set_layer_visible"))?;
        Ok(())
    }

    async fn delete_layer(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error("delete_layer"))?;

        let removed = sqlx::query("DELETE FROM artifacts WHERE layer = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error("delete_layer"))?
            .rows_affected();

        sqlx::query("DELETE FROM layers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error("delete_layer"))?;

        tx.commit().await.map_err(map_sqlx_error("delete_layer"))?;

        tracing::info!(layer = id, removed, "Deleted layer");
        Ok(())
    }
}
