//! The cached content snapshot and the display views built from it

use serde_json::Value;
use tokio::time::Instant;

use super::accessors::{
    format_date, format_time, list, mailto, opt_text, paragraphs, resolve_image_url, text,
    valid_url,
};
use super::media::{ImageUrlBuilder, MediaReference};

/// An untyped record as returned by the content service
pub type Record = Value;

pub const LOAD_ERROR: &str = "Failed to load content";

/// Everything the pages render, as of the last commit
#[derive(Clone, Debug, Default)]
pub struct ContentSnapshot {
    pub site_settings: Option<Record>,
    pub shows: Vec<Record>,
    pub releases: Vec<Record>,
    pub fetched_at: Option<Instant>,
    pub loading: bool,
    pub error: Option<String>,
    /// Failures recorded so far; each one gets the next number
    pub failures: u64,
}

impl ContentSnapshot {
    /// Nothing has been committed yet and no failure was reported
    pub fn is_pending(&self) -> bool {
        self.fetched_at.is_none()
            && self.error.is_none()
            && self.site_settings.is_none()
            && self.shows.is_empty()
            && self.releases.is_empty()
    }
}

/// An image slot on a page; `src` is `None` when the reference did not resolve
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSlot {
    pub src: Option<String>,
    pub alt: String,
}

impl ImageSlot {
    fn from_field(
        builder: &ImageUrlBuilder,
        field: Option<&Value>,
        width: u32,
        height: Option<u32>,
        alt_fallback: &str,
    ) -> Option<Self> {
        let field = field.filter(|v| !v.is_null())?;
        Some(Self {
            src: resolve_image_url(builder, Some(field), width, height),
            alt: text(field.get("alt"), alt_fallback),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct SiteSettingsView {
    pub short_bio: String,
    pub long_bio: Vec<String>,
    pub main_picture: Option<ImageSlot>,
    pub background: Option<String>,
    pub gallery: Vec<MediaReference>,
    pub epk_url: Option<String>,
    pub contact_email: Option<String>,
    pub booking_email: Option<String>,
    pub contact_mailto: Option<String>,
    pub booking_mailto: Option<String>,
}

impl SiteSettingsView {
    pub fn from_record(record: Option<&Record>, builder: &ImageUrlBuilder) -> Self {
        let Some(record) = record else {
            return Self::default();
        };

        let gallery = list(record.get("gallery"))
            .iter()
            .filter_map(|item| match MediaReference::from_value(Some(item)) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unusable gallery entry");
                    None
                }
            })
            .collect();

        Self {
            short_bio: text(record.get("shortBio"), ""),
            long_bio: paragraphs(record.get("longBio")),
            main_picture: ImageSlot::from_field(
                builder,
                record.get("mainPicture"),
                600,
                None,
                "Artist portrait",
            ),
            background: resolve_image_url(builder, record.get("backgroundImage"), 1920, None),
            gallery,
            epk_url: builder.file_url(record.get("epkFile")).ok(),
            contact_email: opt_text(record.get("contactEmail")),
            booking_email: opt_text(record.get("bookingEmail")),
            contact_mailto: mailto(record.get("contactEmail"), "", ""),
            booking_mailto: mailto(record.get("bookingEmail"), "Booking inquiry", ""),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShowView {
    pub id: String,
    pub venue: String,
    pub city: Option<String>,
    pub date: String,
    pub time: String,
    pub ticket_url: Option<String>,
    pub venue_image: Option<ImageSlot>,
}

impl ShowView {
    pub fn from_record(record: &Record, index: usize, builder: &ImageUrlBuilder) -> Self {
        let venue = text(record.get("venue"), "TBA");
        Self {
            id: text(record.get("_id"), &format!("show-{}", index)),
            city: opt_text(record.get("city")),
            date: format_date(record.get("date"), "TBA"),
            time: format_time(record.get("date"), "TBA"),
            ticket_url: valid_url(record.get("ticketLink")),
            venue_image: ImageSlot::from_field(
                builder,
                record.get("venueImage"),
                600,
                Some(400),
                &venue,
            ),
            venue,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseView {
    pub id: String,
    pub title: String,
    pub release_date: String,
    pub cover: Option<ImageSlot>,
    pub stream_url: Option<String>,
    pub buy_url: Option<String>,
    pub lyrics_url: Option<String>,
}

impl ReleaseView {
    pub fn from_record(record: &Record, index: usize, builder: &ImageUrlBuilder) -> Self {
        let title = text(record.get("title"), "Untitled");
        Self {
            id: text(record.get("_id"), &format!("release-{}", index)),
            release_date: format_date(record.get("releaseDate"), "TBA"),
            cover: ImageSlot::from_field(builder, record.get("albumCover"), 400, Some(400), &title),
            stream_url: valid_url(record.get("streamLink")),
            buy_url: valid_url(record.get("buyLink")),
            lyrics_url: valid_url(record.get("lyricsLink")),
            title,
        }
    }
}

/// All page views for one snapshot
#[derive(Clone, Debug, Default)]
pub struct ContentViews {
    pub settings: SiteSettingsView,
    pub shows: Vec<ShowView>,
    pub releases: Vec<ReleaseView>,
}

impl ContentViews {
    pub fn build(snapshot: &ContentSnapshot, builder: &ImageUrlBuilder) -> Self {
        Self {
            settings: SiteSettingsView::from_record(snapshot.site_settings.as_ref(), builder),
            shows: snapshot
                .shows
                .iter()
                .enumerate()
                .map(|(i, record)| ShowView::from_record(record, i, builder))
                .collect(),
            releases: snapshot
                .releases
                .iter()
                .enumerate()
                .map(|(i, record)| ReleaseView::from_record(record, i, builder))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> ImageUrlBuilder {
        ImageUrlBuilder::new("proj", "production")
    }

    #[test]
    fn empty_snapshot_renders_defaults() {
        let views = ContentViews::build(&ContentSnapshot::default(), &builder());
        assert!(views.settings.short_bio.is_empty());
        assert!(views.settings.gallery.is_empty());
        assert!(views.shows.is_empty());
        assert!(ContentSnapshot::default().is_pending());
    }

    #[test]
    fn partial_show_record_degrades_field_by_field() {
        let record = json!({
            "_id": "s1",
            "venue": "",
            "date": "not-a-date",
            "ticketLink": "#",
            "venueImage": { "asset": { "_ref": "broken" } }
        });
        let show = ShowView::from_record(&record, 0, &builder());
        assert_eq!(show.venue, "TBA");
        assert_eq!(show.city, None);
        assert_eq!(show.date, "TBA");
        assert_eq!(show.time, "TBA");
        assert_eq!(show.ticket_url, None);
        let image = show.venue_image.expect("field present keeps its slot");
        assert_eq!(image.src, None);
        assert_eq!(image.alt, "TBA");
    }

    #[test]
    fn release_without_id_gets_positional_id() {
        let record = json!({ "title": "Night Drive", "releaseDate": "2024-06-07" });
        let release = ReleaseView::from_record(&record, 3, &builder());
        assert_eq!(release.id, "release-3");
        assert_eq!(release.title, "Night Drive");
        assert_eq!(release.release_date, "Friday, June 7, 2024");
        assert!(release.cover.is_none());
    }

    #[test]
    fn settings_drop_unusable_gallery_entries() {
        let record = json!({
            "gallery": [
                { "asset": { "_ref": "image-a1-10x10-jpg" } },
                "nonsense-but-string",
                null,
                { "asset": { "_ref": "image-b2-10x10-png" }, "alt": "Backstage" }
            ],
            "contactEmail": "hello@example.com",
            "bookingEmail": 12
        });
        let settings = SiteSettingsView::from_record(Some(&record), &builder());
        assert_eq!(settings.gallery.len(), 3);
        assert_eq!(settings.gallery[2].alt.as_deref(), Some("Backstage"));
        assert_eq!(settings.contact_mailto.as_deref(), Some("mailto:hello@example.com"));
        assert_eq!(settings.booking_email, None);
        assert_eq!(settings.booking_mailto, None);
    }
}
