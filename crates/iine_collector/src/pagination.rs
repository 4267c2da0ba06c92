use iine_core::{ArticleRecord, ArticleSource, Error, Result};

/// Number of pages needed for `total_count` items, never less than one.
pub fn total_pages(total_count: u64, per_page: u32) -> u64 {
    total_count.div_ceil(u64::from(per_page)).max(1)
}

/// Fetches the complete listing, one page after another.
///
/// Page 1 is requested first to learn the total count; the remaining pages
/// follow in order and their items are appended in page order.
pub async fn fetch_all_articles(source: &dyn ArticleSource, per_page: u32) -> Result<Vec<ArticleRecord>> {
    if per_page == 0 {
        return Err(Error::Config("page size must be positive".to_string()));
    }

    let first = source.fetch_page(1, per_page).await?;
    let mut items = first.items;

    let total_count = match first.total_count {
        Some(total) => total,
        None => {
            tracing::warn!("listing response had no Total-Count header, treating it as a single page");
            return Ok(items);
        }
    };

    let pages = total_pages(total_count, per_page);
    tracing::debug!(total_count, pages, per_page, "listing size");

    for page in 2..=pages {
        let page = u32::try_from(page)
            .map_err(|_| Error::Config(format!("listing needs {} pages, too many to request", pages)))?;
        let next = source.fetch_page(page, per_page).await?;
        items.extend(next.items);
    }

    Ok(items)
}
