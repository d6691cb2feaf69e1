//! CSS selectors for Amazon product, review and obstacle markup.
//!
//! Each logical field has several selectors, one per markup generation seen in the
//! wild. The order in which they are tried lives in `extract.rs`; this file only
//! names them.
//!
//! **Update process**: when a field stops resolving, capture the HTML, add a new
//! selector here, register it in the field's chain and add a fixture test.

use scraper::Selector;
use std::sync::LazyLock;

/// Search results page.
pub mod search {
    use super::*;

    /// Search box on the storefront home page.
    pub static SEARCH_BOX: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#twotabsearchtextbox").unwrap());

    /// Organic result title link (2023+ layout).
    pub static RESULT_LINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a.a-link-normal.s-underline-text.s-underline-link-text.s-link-style.a-text-normal",
        )
        .unwrap()
    });

    /// Older result cards with image or underline links.
    pub static RESULT_LINK_LEGACY: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a.a-link-normal.s-no-outline, \
             a.a-link-normal.s-underline-text",
        )
        .unwrap()
    });

    /// Broadest fallback: any normal text link.
    pub static RESULT_LINK_BROAD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a.a-link-normal.a-text-normal").unwrap());
}

/// Product detail page.
pub mod product {
    use super::*;

    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#productTitle").unwrap());

    pub static TITLE_WRAPPER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#title span").unwrap());

    pub static TITLE_LARGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-size-large").unwrap());

    /// "4.1 out of 5" text next to the histogram.
    pub static RATING_OUT_OF: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='rating-out-of-text']").unwrap());

    pub static RATING_POPOVER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#acrPopover span.a-icon-alt").unwrap());

    pub static RATING_ICON: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("i.a-icon-star span.a-icon-alt").unwrap());

    /// Integer part of the buy-box price, e.g. "1,299."
    pub static PRICE_WHOLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-price-whole").unwrap());

    /// Screen-reader price with currency, e.g. "₹1,299.00"
    pub static PRICE_OFFSCREEN: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-offscreen").unwrap());

    /// "12,345 ratings" below the title.
    pub static REVIEW_COUNT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#acrCustomerReviewText").unwrap());

    pub static TOTAL_REVIEW_COUNT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-hook='total-review-count']").unwrap());

    pub static REVIEW_COUNT_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#acrCustomerReviewLink span").unwrap());

    /// Link from the detail page to the review list.
    pub static REVIEWS_LINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[data-hook='see-all-reviews-link-foot'], \
             a#acrCustomerReviewLink",
        )
        .unwrap()
    });

    pub static CANONICAL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("link[rel='canonical']").unwrap());

    pub static ASIN_INPUT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("input[name='ASIN']").unwrap());
}

/// Rating histogram, in its three historical layouts plus the aria-label variant.
pub mod histogram {
    use super::*;

    /// 2024+ layout: one div per bar.
    pub static BAR: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div[data-hook='histogram-bar']").unwrap());

    pub static BAR_LABEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-size-base").unwrap());

    pub static BAR_PERCENT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-size-base.a-text-right").unwrap());

    /// Legacy table layout.
    pub static TABLE_ROW: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("table#histogramTable tr").unwrap());

    pub static ROW_LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a, span").unwrap());

    pub static ROW_PERCENT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("td.a-text-right").unwrap());

    /// Compact layout: parallel label and percentage spans.
    pub static COMPACT_LABEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='histogram-bar-label']").unwrap());

    pub static COMPACT_PERCENT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='histogram-bar-percentage']").unwrap());

    /// List layout where each bar link carries "61 percent of reviews have 5 stars".
    pub static ARIA_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#histogramTable a[aria-label]").unwrap());
}

/// Review list page.
pub mod reviews {
    use super::*;

    pub static BLOCK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "div[data-hook='review'], \
             li[data-hook='review']",
        )
        .unwrap()
    });

    /// Used when the primary block selector finds nothing on the first page.
    pub static BLOCK_ALTERNATE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "div.review, \
             div[data-hook='review-collapsed'], \
             div.a-section.review",
        )
        .unwrap()
    });

    pub static STAR_RATING: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "i[data-hook='review-star-rating'] span.a-icon-alt, \
             i[data-hook='cmps-review-star-rating'] span.a-icon-alt",
        )
        .unwrap()
    });

    pub static STAR_RATING_ANY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-icon-alt").unwrap());

    /// Star rating carried in the class name, e.g. `a-star-4`.
    pub static STAR_CLASS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("i[class*='a-star-']").unwrap());

    pub static BODY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='review-body'] span").unwrap());

    pub static BODY_DIRECT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='review-body']").unwrap());

    pub static BODY_LEGACY: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "span.review-text-content span, \
             span.review-text",
        )
        .unwrap()
    });

    pub static DATE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "span[data-hook='review-date'], \
             span.review-date",
        )
        .unwrap()
    });

    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[data-hook='review-title'] span, \
             span[data-hook='review-title'] span",
        )
        .unwrap()
    });

    /// "Next page" control, current layout.
    pub static NEXT_PAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("li.a-last a").unwrap());

    pub static NEXT_PAGE_ARIA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[aria-label='Next page'], \
             a[aria-label='next page']",
        )
        .unwrap()
    });
}

/// Consent and preference prompts that block interaction until dismissed.
pub mod obstacles {
    use super::*;

    pub static DISMISS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "input[data-action-type='DISMISS'], \
             span[data-action-type='DISMISS']",
        )
        .unwrap()
    });

    /// "Don't Change" on the location/currency preference prompt.
    pub static KEEP_PREFERENCE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"input[value="Don't Change"]"#).unwrap());
}

/// Anti-automation and error pages.
pub mod errors {
    use super::*;

    pub static CAPTCHA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form[action*='validateCaptcha'], \
             img[src*='captcha']",
        )
        .unwrap()
    });

    /// Dog page (Amazon's 503 page).
    pub static DOG_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "img[alt*='dog'], \
             a[href='/ref=cs_503_link']",
        )
        .unwrap()
    });
}
