// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Postgres store operations for pools and groups.
//!
//! The `FOR UPDATE` variants are the serialization points of the whole
//! system: rotation serializes on the pool row, admission on the group row.

use sqlx::{PgConnection, PgPool};

use super::{ActiveInvite, GroupRecord, PoolRecord};

// ============================================================================
// Pool Operations
// ============================================================================

/// Get a pool by slug without locking (read path).
pub async fn find_pool_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<PoolRecord>, sqlx::Error> {
    sqlx::query_as::<_, PoolRecord>(
        r#"
        SELECT id, slug, title, instance_name, capacity_threshold, bootstrap_members,
               photo_url, description, current_group_id, next_sequence, created_at, updated_at
        FROM group_pools
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// Get a pool by slug with an exclusive row lock, serializing concurrent
/// rotations for the same pool. Blocks until any competing transaction
/// commits or rolls back.
pub async fn lock_pool_by_slug(
    conn: &mut PgConnection,
    slug: &str,
) -> Result<Option<PoolRecord>, sqlx::Error> {
    sqlx::query_as::<_, PoolRecord>(
        r#"
        SELECT id, slug, title, instance_name, capacity_threshold, bootstrap_members,
               photo_url, description, current_group_id, next_sequence, created_at, updated_at
        FROM group_pools
        WHERE slug = $1
        FOR UPDATE
        "#,
    )
    .bind(slug)
    .fetch_optional(&mut *conn)
    .await
}

/// Resolve the pool an admission targets.
///
/// With a campaign slug the lookup is exact (slug + instance). Without one,
/// the FIRST pool bound to the instance is chosen (`ORDER BY id`), a
/// documented limitation carried over from the original behavior, not an
/// error. An instance serving multiple pools should always pass a campaign.
pub async fn find_pool_for_instance(
    conn: &mut PgConnection,
    instance: &str,
    campaign: Option<&str>,
) -> Result<Option<PoolRecord>, sqlx::Error> {
    match campaign {
        Some(slug) => {
            sqlx::query_as::<_, PoolRecord>(
                r#"
                SELECT id, slug, title, instance_name, capacity_threshold, bootstrap_members,
                       photo_url, description, current_group_id, next_sequence, created_at, updated_at
                FROM group_pools
                WHERE slug = $1 AND instance_name = $2
                "#,
            )
            .bind(slug)
            .bind(instance)
            .fetch_optional(&mut *conn)
            .await
        }
        None => {
            sqlx::query_as::<_, PoolRecord>(
                r#"
                SELECT id, slug, title, instance_name, capacity_threshold, bootstrap_members,
                       photo_url, description, current_group_id, next_sequence, created_at, updated_at
                FROM group_pools
                WHERE instance_name = $1
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(instance)
            .fetch_optional(&mut *conn)
            .await
        }
    }
}

/// Point the pool at its freshly created group and advance the sequence.
/// Both fields move together or not at all; callers run this inside the
/// rotation transaction.
pub async fn activate_group(
    conn: &mut PgConnection,
    pool_id: i64,
    group_id: i64,
    next_sequence: i32,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE group_pools
        SET current_group_id = $2,
            next_sequence = $3,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(pool_id)
    .bind(group_id)
    .bind(next_sequence)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    Ok(())
}

// ============================================================================
// Group Operations
// ============================================================================

/// Get an ACTIVE group by id with an exclusive row lock. This is the
/// admission serialization point: the capacity check and the member-count
/// increment happen under this lock.
///
/// Returns `None` both when the row is missing and when its status is no
/// longer ACTIVE; admission folds the two cases together.
pub async fn lock_group(
    conn: &mut PgConnection,
    group_id: i64,
) -> Result<Option<GroupRecord>, sqlx::Error> {
    sqlx::query_as::<_, GroupRecord>(
        r#"
        SELECT id, pool_id, sequence, external_group_id, invite_url, member_count,
               status::text AS status, created_at, updated_at
        FROM pool_groups
        WHERE id = $1 AND status = 'ACTIVE'
        FOR UPDATE
        "#,
    )
    .bind(group_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Insert a freshly provisioned group as ACTIVE and return the full record.
pub async fn insert_group(
    conn: &mut PgConnection,
    pool_id: i64,
    sequence: i32,
    external_group_id: &str,
    invite_url: &str,
    member_count: i32,
) -> Result<GroupRecord, sqlx::Error> {
    sqlx::query_as::<_, GroupRecord>(
        r#"
        INSERT INTO pool_groups
            (pool_id, sequence, external_group_id, invite_url, member_count, status, created_at, updated_at)
        VALUES
            ($1, $2, $3, $4, $5, 'ACTIVE', NOW(), NOW())
        RETURNING id, pool_id, sequence, external_group_id, invite_url, member_count,
                  status::text AS status, created_at, updated_at
        "#,
    )
    .bind(pool_id)
    .bind(sequence)
    .bind(external_group_id)
    .bind(invite_url)
    .bind(member_count)
    .fetch_one(&mut *conn)
    .await
}

/// Record one successful admission. Callers hold the group row lock from
/// [`lock_group`] in the same transaction.
pub async fn increment_member_count(
    conn: &mut PgConnection,
    group_id: i64,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pool_groups
        SET member_count = member_count + 1,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(group_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    Ok(())
}

// ============================================================================
// Read Path
// ============================================================================

/// Resolve the invite URL for a slug's active group.
///
/// A single joined read with no locking: the public redirect surface calls
/// this on every hit. Absence of the pool, of an active group, or of an
/// invite link all collapse to `None`; the public surface never
/// distinguishes them.
pub async fn resolve_active_invite(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<ActiveInvite>, sqlx::Error> {
    sqlx::query_as::<_, ActiveInvite>(
        r#"
        SELECT p.title, g.invite_url
        FROM group_pools p
        JOIN pool_groups g ON g.id = p.current_group_id
        WHERE p.slug = $1
          AND g.status = 'ACTIVE'
          AND g.invite_url IS NOT NULL
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// Database liveness probe for the health endpoint.
pub async fn health_check(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;
    Ok(row.0 == 1)
}
