// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diesel-backed implementation of the mapping store

use crate::model::Network;
use crate::model::NetworkMapping;
use crate::model::NetworkSegment;
use crate::model::NetworkUplinkset;
use crate::Error;
use crate::MappingStore;
use async_bb8_diesel::AsyncConnection;
use async_bb8_diesel::AsyncRunQueryDsl;
use async_bb8_diesel::ConnectionManager;
use async_trait::async_trait;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::SelectableHelper;
use fabric_sync_common::LogicalNetwork;
use fabric_sync_common::Segment;
use uuid::Uuid;

pub type DbConnection = diesel::PgConnection;

/// Primary interface to the mapping database
pub struct DataStore {
    pool: bb8::Pool<ConnectionManager<DbConnection>>,
}

impl DataStore {
    pub fn new(pool: bb8::Pool<ConnectionManager<DbConnection>>) -> DataStore {
        DataStore { pool }
    }

    async fn conn(
        &self,
    ) -> Result<
        bb8::PooledConnection<'_, ConnectionManager<DbConnection>>,
        Error,
    > {
        self.pool.get().await.map_err(|e| Error::Connection(e.to_string()))
    }
}

#[async_trait]
impl MappingStore for DataStore {
    async fn networks_with_segments(
        &self,
    ) -> Result<Vec<(LogicalNetwork, Segment)>, Error> {
        use crate::schema::network;
        use crate::schema::network_segment;

        let conn = self.conn().await?;
        let rows: Vec<(Network, NetworkSegment)> = network::table
            .inner_join(network_segment::table)
            .filter(network_segment::physical_network.is_not_null())
            .select((Network::as_select(), NetworkSegment::as_select()))
            .load_async(&*conn)
            .await?;

        rows.into_iter()
            .map(|(network, segment)| {
                Ok((network.into(), Segment::try_from(segment)?))
            })
            .collect()
    }

    async fn networks(&self) -> Result<Vec<LogicalNetwork>, Error> {
        use crate::schema::network::dsl;

        let conn = self.conn().await?;
        let rows: Vec<Network> = dsl::network
            .select(Network::as_select())
            .load_async(&*conn)
            .await?;
        Ok(rows.into_iter().map(LogicalNetwork::from).collect())
    }

    async fn network_segment(
        &self,
        network_id: Uuid,
    ) -> Result<Option<Segment>, Error> {
        use crate::schema::network_segment::dsl;

        let conn = self.conn().await?;
        let row: Option<NetworkSegment> = dsl::network_segment
            .filter(dsl::network_id.eq(network_id))
            .select(NetworkSegment::as_select())
            .first_async(&*conn)
            .await
            .optional()?;
        row.map(Segment::try_from).transpose().map_err(Error::from)
    }

    async fn network_mapping(
        &self,
        network_id: Uuid,
    ) -> Result<Option<NetworkMapping>, Error> {
        use crate::schema::fabric_network_mapping::dsl;

        let conn = self.conn().await?;
        Ok(dsl::fabric_network_mapping
            .filter(dsl::logical_network_id.eq(network_id))
            .select(NetworkMapping::as_select())
            .first_async(&*conn)
            .await
            .optional()?)
    }

    async fn network_uplinksets(
        &self,
        fabric_network_id: &str,
    ) -> Result<Vec<String>, Error> {
        use crate::schema::fabric_network_uplinkset::dsl;

        let conn = self.conn().await?;
        Ok(dsl::fabric_network_uplinkset
            .filter(dsl::fabric_network_id.eq(fabric_network_id.to_string()))
            .order(dsl::time_created.asc())
            .select(dsl::uplinkset_id)
            .load_async(&*conn)
            .await?)
    }

    async fn map_network(
        &self,
        network_id: Uuid,
        fabric_network_id: &str,
        uplinkset_ids: &[String],
        manageable: bool,
    ) -> Result<(), Error> {
        let mapping =
            NetworkMapping::new(network_id, fabric_network_id, manageable);
        let bindings: Vec<NetworkUplinkset> = uplinkset_ids
            .iter()
            .map(|uplinkset_id| {
                NetworkUplinkset::new(fabric_network_id, uplinkset_id)
            })
            .collect();

        let conn = self.conn().await?;
        conn.transaction_async(|conn| async move {
            use crate::schema::fabric_network_mapping::dsl as mapping_dsl;
            use crate::schema::fabric_network_uplinkset::dsl as binding_dsl;

            diesel::insert_into(mapping_dsl::fabric_network_mapping)
                .values(mapping)
                .on_conflict(mapping_dsl::logical_network_id)
                .do_nothing()
                .execute_async(&conn)
                .await?;

            if !bindings.is_empty() {
                diesel::insert_into(binding_dsl::fabric_network_uplinkset)
                    .values(bindings)
                    .on_conflict((
                        binding_dsl::fabric_network_id,
                        binding_dsl::uplinkset_id,
                    ))
                    .do_nothing()
                    .execute_async(&conn)
                    .await?;
            }

            Ok::<(), diesel::result::Error>(())
        })
        .await?;
        Ok(())
    }

    async fn unmap_network(&self, network_id: Uuid) -> Result<(), Error> {
        use crate::schema::fabric_network_mapping::dsl;

        let conn = self.conn().await?;
        diesel::delete(
            dsl::fabric_network_mapping
                .filter(dsl::logical_network_id.eq(network_id)),
        )
        .execute_async(&*conn)
        .await?;
        Ok(())
    }

    async fn delete_uplinkset_bindings(
        &self,
        fabric_network_id: &str,
    ) -> Result<(), Error> {
        use crate::schema::fabric_network_uplinkset::dsl;

        let conn = self.conn().await?;
        diesel::delete(dsl::fabric_network_uplinkset.filter(
            dsl::fabric_network_id.eq(fabric_network_id.to_string()),
        ))
        .execute_async(&*conn)
        .await?;
        Ok(())
    }

    async fn add_uplinkset_binding(
        &self,
        fabric_network_id: &str,
        uplinkset_id: &str,
    ) -> Result<(), Error> {
        use crate::schema::fabric_network_uplinkset::dsl;

        let conn = self.conn().await?;
        diesel::insert_into(dsl::fabric_network_uplinkset)
            .values(NetworkUplinkset::new(fabric_network_id, uplinkset_id))
            .on_conflict((dsl::fabric_network_id, dsl::uplinkset_id))
            .do_nothing()
            .execute_async(&*conn)
            .await?;
        Ok(())
    }

    async fn remove_uplinkset_binding(
        &self,
        fabric_network_id: &str,
        uplinkset_id: &str,
    ) -> Result<(), Error> {
        use crate::schema::fabric_network_uplinkset::dsl;

        let conn = self.conn().await?;
        diesel::delete(
            dsl::fabric_network_uplinkset
                .filter(
                    dsl::fabric_network_id.eq(fabric_network_id.to_string()),
                )
                .filter(dsl::uplinkset_id.eq(uplinkset_id.to_string())),
        )
        .execute_async(&*conn)
        .await?;
        Ok(())
    }
}
