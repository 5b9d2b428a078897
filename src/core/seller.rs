//! Seller directory - Handles seller lookups, creation and slug generation.
//!
//! A seller's slug is derived from the first word of their name: lowercased, diacritics
//! stripped, anything that is not an ASCII letter or digit removed. When the slug is
//! already taken by another seller, an incrementing numeric suffix is appended
//! (`ana`, `ana2`, `ana3`, ...). Slug generation is deterministic, and re-running it on
//! a seller whose name did not change keeps the slug it already has.

use crate::{
    config::sellers::SellerConfig,
    core::clock::Clock,
    entities::{Seller, seller},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

const FALLBACK_SLUG: &str = "seller";

/// Derives the slug base (no collision suffix) from a seller name.
///
/// Falls back to `"seller"` when the first word has no usable characters.
#[must_use]
pub fn slug_base(name: &str) -> String {
    let first_word = name.split_whitespace().next().unwrap_or_default();

    let base: String = first_word
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect();

    if base.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        base
    }
}

/// Whether `slug` is `base` itself or `base` followed by a numeric collision suffix.
#[must_use]
pub fn slug_matches_base(slug: &str, base: &str) -> bool {
    slug.strip_prefix(base).is_some_and(|suffix| {
        suffix.is_empty() || (suffix.chars().all(|c| c.is_ascii_digit()) && !suffix.starts_with('0'))
    })
}

/// Picks the first free slug for `base`: the base itself, then `base2`, `base3`, ...
#[must_use]
pub fn resolve_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    (2_u64..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

async fn slugs_starting_with<C>(db: &C, base: &str, exclude_id: Option<i64>) -> Result<HashSet<String>>
where
    C: ConnectionTrait,
{
    let mut query = Seller::find().filter(seller::Column::Slug.starts_with(base));
    if let Some(id) = exclude_id {
        query = query.filter(seller::Column::Id.ne(id));
    }

    Ok(query.all(db).await?.into_iter().map(|s| s.slug).collect())
}

/// Finds a seller by its unique ID.
pub async fn get_seller_by_id<C>(db: &C, seller_id: i64) -> Result<Option<seller::Model>>
where
    C: ConnectionTrait,
{
    Seller::find_by_id(seller_id).one(db).await.map_err(Into::into)
}

/// Retrieves all sellers, ordered alphabetically by name.
pub async fn get_all_sellers(db: &DatabaseConnection) -> Result<Vec<seller::Model>> {
    Seller::find()
        .order_by_asc(seller::Column::Name)
        .order_by_asc(seller::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a seller by slug.
pub async fn get_seller_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<seller::Model>> {
    Seller::find()
        .filter(seller::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a seller by email.
pub async fn get_seller_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<seller::Model>> {
    Seller::find()
        .filter(seller::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a seller and assigns it a unique slug.
///
/// The name and email are trimmed; an empty name is rejected.
#[instrument(skip(db, clock))]
pub async fn create_seller(
    db: &DatabaseConnection,
    clock: &impl Clock,
    name: &str,
    email: &str,
) -> Result<seller::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Seller name cannot be empty".to_string(),
        });
    }

    let base = slug_base(name);
    let taken = slugs_starting_with(db, &base, None).await?;
    let slug = resolve_slug(&base, &taken);

    let seller = seller::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.trim().to_string()),
        slug: Set(slug),
        created_at: Set(clock.now()),
        ..Default::default()
    };

    let result = seller.insert(db).await?;
    info!(seller_id = result.id, slug = %result.slug, "Seller created");
    Ok(result)
}

/// Renames a seller. The slug is regenerated only when the new name yields a different
/// slug base.
#[instrument(skip(db))]
pub async fn rename_seller(
    db: &DatabaseConnection,
    seller_id: i64,
    name: &str,
) -> Result<seller::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Seller name cannot be empty".to_string(),
        });
    }

    let existing = get_seller_by_id(db, seller_id)
        .await?
        .ok_or(Error::SellerNotFound { id: seller_id })?;

    let base = slug_base(name);
    let slug = if slug_matches_base(&existing.slug, &base) {
        existing.slug.clone()
    } else {
        let taken = slugs_starting_with(db, &base, Some(seller_id)).await?;
        resolve_slug(&base, &taken)
    };

    let mut active_model: seller::ActiveModel = existing.into();
    active_model.name = Set(name.to_string());
    active_model.slug = Set(slug);
    active_model.update(db).await.map_err(Into::into)
}

/// Re-derives every seller's slug from their current name.
///
/// Sellers whose slug already matches their name keep it, so running this twice changes
/// nothing the second time. Returns how many slugs changed.
#[instrument(skip(db))]
pub async fn refresh_slugs(db: &DatabaseConnection) -> Result<usize> {
    let sellers = Seller::find()
        .order_by_asc(seller::Column::Id)
        .all(db)
        .await?;

    let mut taken: HashSet<String> = sellers.iter().map(|s| s.slug.clone()).collect();
    let mut changed = 0;

    for existing in sellers {
        let base = slug_base(&existing.name);
        if slug_matches_base(&existing.slug, &base) {
            continue;
        }

        taken.remove(&existing.slug);
        let slug = resolve_slug(&base, &taken);
        taken.insert(slug.clone());

        debug!(seller_id = existing.id, old = %existing.slug, new = %slug, "Refreshing slug");
        let mut active_model: seller::ActiveModel = existing.into();
        active_model.slug = Set(slug);
        active_model.update(db).await?;
        changed += 1;
    }

    info!(changed, "Seller slugs refreshed");
    Ok(changed)
}

/// Creates the configured sellers that do not exist yet (matched by email).
///
/// Returns how many sellers were created.
#[instrument(skip(db, clock, sellers))]
pub async fn seed_sellers(
    db: &DatabaseConnection,
    clock: &impl Clock,
    sellers: &[SellerConfig],
) -> Result<usize> {
    let mut created = 0;

    for cfg_seller in sellers {
        if get_seller_by_email(db, cfg_seller.email.trim()).await?.is_some() {
            debug!(email = %cfg_seller.email, "Seller already exists, skipping");
            continue;
        }

        create_seller(db, clock, &cfg_seller.name, &cfg_seller.email).await?;
        created += 1;
    }

    info!(created, "Seed sellers processed");
    Ok(created)
}
