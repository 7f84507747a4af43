//! Restaurant rows written for the ranking service.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

use super::connection::DatasetDb;
use super::schema;
use crate::Error;
use crate::model::{Coordinate, Semantics};

/// One output row per collated restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRow {
    /// Stable identity hash of the restaurant.
    pub id: u64,
    pub name: String,
    pub address: String,
    /// Source review URLs joined with `,`.
    pub urls: String,
    pub semantics: Semantics,
    pub coordinate: Coordinate,
    pub closest_station_name: String,
    pub closest_station_dist: f64,
    pub access_count: i64,
}

impl DatasetDb {
    /// Replace the dataset with `rows`.
    ///
    /// Recreates all tables and inserts every row inside one transaction, so
    /// the ranking service never observes a partially written dataset.
    /// Returns the number of rows written.
    pub async fn write_restaurants(&self, rows: Vec<RestaurantRow>) -> Result<usize, Error> {
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                schema::recreate(&tx)?;

                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO reviews(
                            name, address, urls,
                            delicious, accommodating, affordable, atmospheric,
                            latitude, longitude,
                            closestStnDist, closestStnName,
                            accessCount, id
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    )?;

                    for row in &rows {
                        stmt.execute(params![
                            &row.name,
                            &row.address,
                            &row.urls,
                            row.semantics.delicious,
                            row.semantics.accommodating,
                            row.semantics.affordable,
                            row.semantics.atmospheric,
                            row.coordinate.latitude,
                            row.coordinate.longitude,
                            row.closest_station_dist,
                            &row.closest_station_name,
                            row.access_count,
                            row.id as i64,
                        ])?;
                    }
                }

                tx.commit()?;
                Ok(rows.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of restaurant rows currently stored.
    pub async fn count_restaurants(&self) -> Result<i64, Error> {
        self.conn
            .call(|conn| -> Result<i64, Error> {
                let count = conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
            .map_err(Error::from)
    }

    /// Fetch a single row by id.
    pub async fn get_restaurant(&self, id: u64) -> Result<Option<RestaurantRow>, Error> {
        self.conn
            .call(move |conn| -> Result<Option<RestaurantRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT name, address, urls,
                            delicious, accommodating, affordable, atmospheric,
                            latitude, longitude, closestStnDist, closestStnName, accessCount
                     FROM reviews WHERE id = ?1",
                )?;

                let mut rows = stmt.query(params![id as i64])?;
                let Some(row) = rows.next()? else {
                    return Ok(None);
                };

                Ok(Some(RestaurantRow {
                    id,
                    name: row.get(0)?,
                    address: row.get(1)?,
                    urls: row.get(2)?,
                    semantics: Semantics {
                        delicious: row.get(3)?,
                        accommodating: row.get(4)?,
                        affordable: row.get(5)?,
                        atmospheric: row.get(6)?,
                    },
                    coordinate: Coordinate { latitude: row.get(7)?, longitude: row.get(8)? },
                    closest_station_dist: row.get(9)?,
                    closest_station_name: row.get(10)?,
                    access_count: row.get(11)?,
                }))
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64, name: &str) -> RestaurantRow {
        RestaurantRow {
            id,
            name: name.to_string(),
            address: "1-2-3 Minatomirai, Yokohama".to_string(),
            urls: "https://tabelog.com/a,https://www.tripadvisor.com/b".to_string(),
            semantics: Semantics { accommodating: 0.1, affordable: -0.2, atmospheric: 0.3, delicious: 0.5 },
            coordinate: Coordinate::new(35.4566, 139.6317),
            closest_station_name: "Minatomirai".to_string(),
            closest_station_dist: 0.25,
            access_count: 0,
        }
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let db = DatasetDb::open_in_memory().await.unwrap();
        let written = db.write_restaurants(vec![row(1, "Kaikaro"), row(2, "Sumiyaki")]).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(db.count_restaurants().await.unwrap(), 2);

        let fetched = db.get_restaurant(1).await.unwrap().unwrap();
        assert_eq!(fetched, row(1, "Kaikaro"));
        assert!(db.get_restaurant(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_high_bit_ids_round_trip() {
        let db = DatasetDb::open_in_memory().await.unwrap();
        let id = 0xcbf2_9ce4_8422_2325_u64;
        db.write_restaurants(vec![row(id, "Kaikaro")]).await.unwrap();

        let fetched = db.get_restaurant(id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn test_rewrite_replaces_dataset() {
        let db = DatasetDb::open_in_memory().await.unwrap();
        db.write_restaurants(vec![row(1, "A"), row(2, "B"), row(3, "C")]).await.unwrap();
        db.write_restaurants(vec![row(4, "D")]).await.unwrap();

        assert_eq!(db.count_restaurants().await.unwrap(), 1);
        assert!(db.get_restaurant(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_ids_fail_whole_write() {
        let db = DatasetDb::open_in_memory().await.unwrap();
        db.write_restaurants(vec![row(7, "Before")]).await.unwrap();

        let result = db.write_restaurants(vec![row(1, "A"), row(1, "B")]).await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(db.get_restaurant(7).await.unwrap().unwrap().name, "Before");
    }
}
