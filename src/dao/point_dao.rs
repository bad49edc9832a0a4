// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::StoreError;
use crate::filters::PointsFilter;
use crate::models::Point;
use crate::postgres_tools::StopoverPostgresPool;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use std::sync::Arc;

/// CRUD, bounds and lookup queries over the `points` relation. Powers
/// autocomplete and origin/destination resolution.
pub struct PointDao {
    pool: Arc<StopoverPostgresPool>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl PointDao {
    pub fn new(pool: Arc<StopoverPostgresPool>) -> PointDao {
        PointDao { pool }
    }

    pub async fn insert_many(&self, points: &[Point]) -> Result<usize, StoreError> {
        use crate::schema::points::dsl;

        if points.is_empty() {
            return Ok(0);
        }

        let conn = &mut self.pool.get().await?;
        let inserted = diesel::insert_into(dsl::points)
            .values(points)
            .execute(conn)
            .await?;
        Ok(inserted)
    }

    pub async fn upsert_many(&self, points: &[Point]) -> Result<usize, StoreError> {
        use crate::schema::points::dsl;

        if points.is_empty() {
            return Ok(0);
        }

        let conn = &mut self.pool.get().await?;
        let affected = diesel::insert_into(dsl::points)
            .values(points)
            .on_conflict(dsl::id)
            .do_update()
            .set((
                dsl::x.eq(excluded(dsl::x)),
                dsl::y.eq(excluded(dsl::y)),
                dsl::name.eq(excluded(dsl::name)),
            ))
            .execute(conn)
            .await?;
        Ok(affected)
    }

    pub async fn select_all(&self) -> Result<Vec<Point>, StoreError> {
        use crate::schema::points::dsl;

        let conn = &mut self.pool.get().await?;
        let rows = dsl::points
            .select(Point::as_select())
            .load::<Point>(conn)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        use crate::schema::points::dsl;

        let conn = &mut self.pool.get().await?;
        let n = dsl::points.count().get_result::<i64>(conn).await?;
        Ok(n)
    }

    pub async fn find_by_id(&self, point_id: &str) -> Result<Option<Point>, StoreError> {
        use crate::schema::points::dsl;

        let conn = &mut self.pool.get().await?;
        let row = dsl::points
            .filter(dsl::id.eq(point_id))
            .select(Point::as_select())
            .first::<Point>(conn)
            .await
            .optional()?;
        Ok(row)
    }

    pub async fn find_by_coordinates(&self, x: f64, y: f64) -> Result<Option<Point>, StoreError> {
        use crate::schema::points::dsl;

        let conn = &mut self.pool.get().await?;
        let row = dsl::points
            .filter(dsl::x.eq(x))
            .filter(dsl::y.eq(y))
            .select(Point::as_select())
            .first::<Point>(conn)
            .await
            .optional()?;
        Ok(row)
    }

    /// Filtered lookup for the autocomplete surfaces. Name and id parts
    /// match anywhere in the value.
    pub async fn select_with_filter(&self, filter: &PointsFilter) -> Result<Vec<Point>, StoreError> {
        use crate::schema::points::dsl;

        let conn = &mut self.pool.get().await?;

        let mut query = dsl::points.select(Point::as_select()).into_boxed();

        if let Some(x) = filter.x {
            query = query.filter(dsl::x.eq(x));
        }
        if let Some(y) = filter.y {
            query = query.filter(dsl::y.eq(y));
        }
        if !filter.name_part.is_empty() {
            query = query.filter(dsl::name.like(format!("%{}%", filter.name_part)));
        }
        if !filter.id_part.is_empty() {
            query = query.filter(dsl::id.like(format!("%{}%", filter.id_part)));
        }
        if filter.limit > 0 {
            query = query.limit(filter.limit);
        }

        let rows = query.load::<Point>(conn).await?;
        Ok(rows)
    }

    pub async fn get_bounds(&self) -> Result<Option<PointBounds>, StoreError> {
        use crate::schema::points::dsl;
        use diesel::dsl::{max, min};

        let conn = &mut self.pool.get().await?;
        let (min_x, max_x, min_y, max_y) = dsl::points
            .select((min(dsl::x), max(dsl::x), min(dsl::y), max(dsl::y)))
            .first::<(Option<f64>, Option<f64>, Option<f64>, Option<f64>)>(conn)
            .await?;

        Ok(match (min_x, max_x, min_y, max_y) {
            (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) => Some(PointBounds {
                min_x,
                max_x,
                min_y,
                max_y,
            }),
            _ => None,
        })
    }
}
