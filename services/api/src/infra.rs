use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use shopspace::access::ActorId;
use shopspace::articles::{Article, ArticleId};
use shopspace::config::StoreConfig;
use shopspace::inquiries::{Inquiry, InquiryId, InquiryStatus};
use shopspace::listings::{Listing, ListingId, ListingStatus};
use shopspace::store::{HostedStore, MemoryStore, SharedStore};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store handles for every table the back office touches.
#[derive(Clone)]
pub(crate) struct Stores {
    pub(crate) listings: SharedStore<Listing>,
    pub(crate) inquiries: SharedStore<Inquiry>,
    pub(crate) articles: SharedStore<Article>,
}

pub(crate) fn build_stores(
    config: &StoreConfig,
    client: &reqwest::Client,
    seed_demo: bool,
    now: DateTime<Utc>,
) -> Stores {
    match config {
        StoreConfig::Hosted(hosted) => {
            info!(base_url = %hosted.base_url, "using hosted store");
            Stores {
                listings: Arc::new(HostedStore::<Listing>::new(client.clone(), hosted)),
                inquiries: Arc::new(HostedStore::<Inquiry>::new(client.clone(), hosted)),
                articles: Arc::new(HostedStore::<Article>::new(client.clone(), hosted)),
            }
        }
        StoreConfig::Memory if seed_demo => {
            info!("using in-memory store seeded with demo data");
            let listings = demo_listings(now);
            let inquiries = demo_inquiries(&listings, now);
            Stores {
                listings: Arc::new(MemoryStore::with_records(listings)),
                inquiries: Arc::new(MemoryStore::with_records(inquiries)),
                articles: Arc::new(MemoryStore::with_records(demo_articles(now))),
            }
        }
        StoreConfig::Memory => {
            info!("using empty in-memory store");
            Stores {
                listings: Arc::new(MemoryStore::<Listing>::default()),
                inquiries: Arc::new(MemoryStore::<Inquiry>::default()),
                articles: Arc::new(MemoryStore::<Article>::default()),
            }
        }
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("invalid timestamp '{value}': {err}"))
}

struct Seed {
    title: &'static str,
    province: &'static str,
    district: &'static str,
    category: &'static str,
    price: u64,
    area_sqm: f64,
    status: ListingStatus,
    trashed_days_ago: Option<i64>,
}

const SEEDS: [Seed; 6] = [
    Seed {
        title: "강남 오피스 전층",
        province: "서울",
        district: "강남구",
        category: "사무실",
        price: 120_000,
        area_sqm: 330.0,
        status: ListingStatus::Active,
        trashed_days_ago: None,
    },
    Seed {
        title: "서초 오피스 3층",
        province: "서울",
        district: "서초구",
        category: "사무실",
        price: 45_000,
        area_sqm: 98.5,
        status: ListingStatus::Pending,
        trashed_days_ago: None,
    },
    Seed {
        title: "해운대 해변 카페",
        province: "부산",
        district: "해운대구",
        category: "카페",
        price: 38_000,
        area_sqm: 72.0,
        status: ListingStatus::Sold,
        trashed_days_ago: None,
    },
    Seed {
        title: "판교 테크노밸리 상가",
        province: "경기",
        district: "성남시",
        category: "상가",
        price: 61_000,
        area_sqm: 120.0,
        status: ListingStatus::Hidden,
        trashed_days_ago: Some(3),
    },
    Seed {
        title: "대전 둔산동 학원",
        province: "대전",
        district: "서구",
        category: "학원",
        price: 27_500,
        area_sqm: 150.0,
        status: ListingStatus::Active,
        trashed_days_ago: Some(26),
    },
    Seed {
        title: "광주 충장로 의류매장",
        province: "광주",
        district: "동구",
        category: "상가",
        price: 19_000,
        area_sqm: 55.0,
        status: ListingStatus::Pending,
        trashed_days_ago: Some(34),
    },
];

pub(crate) fn demo_listings(now: DateTime<Utc>) -> Vec<Listing> {
    SEEDS
        .iter()
        .enumerate()
        .map(|(index, seed)| {
            let created_at = now - Duration::days(60 - index as i64 * 7);
            let deleted_at = seed.trashed_days_ago.map(|days| now - Duration::days(days));
            Listing {
                id: ListingId::generate(),
                listing_number: index as u32 + 1,
                title: seed.title.to_string(),
                description: format!("{} {} 소재 {}", seed.province, seed.district, seed.category),
                province: seed.province.to_string(),
                district: seed.district.to_string(),
                address: None,
                category: Some(seed.category.to_string()),
                price: Some(seed.price),
                deposit: None,
                monthly_rent: None,
                area_sqm: Some(seed.area_sqm),
                floor: Some(1),
                image_urls: Vec::new(),
                view_count: Some((index as u64 + 1) * 17),
                status: seed.status,
                deleted_at,
                deleted_by: deleted_at.map(|_| ActorId("demo-operator".to_string())),
                created_at: Some(created_at),
                updated_at: Some(deleted_at.unwrap_or(created_at)),
            }
        })
        .collect()
}

pub(crate) fn demo_inquiries(listings: &[Listing], now: DateTime<Utc>) -> Vec<Inquiry> {
    let target = listings.iter().find(|listing| listing.is_live());
    vec![
        Inquiry {
            id: InquiryId::generate(),
            listing_id: target.map(|listing| listing.id),
            name: "김도윤".to_string(),
            phone: "010-2345-6789".to_string(),
            email: Some("doyoon@example.com".to_string()),
            message: "주차 공간과 관리비가 궁금합니다.".to_string(),
            status: InquiryStatus::New,
            admin_note: None,
            created_at: Some(now - Duration::hours(5)),
            updated_at: None,
        },
        Inquiry {
            id: InquiryId::generate(),
            listing_id: None,
            name: "이하은".to_string(),
            phone: "010-8765-4321".to_string(),
            email: None,
            message: "부산 지역 카페 매물을 추천해 주세요.".to_string(),
            status: InquiryStatus::InProgress,
            admin_note: Some("해운대 매물 안내 예정".to_string()),
            created_at: Some(now - Duration::days(2)),
            updated_at: Some(now - Duration::days(1)),
        },
    ]
}

pub(crate) fn demo_articles(now: DateTime<Utc>) -> Vec<Article> {
    vec![
        Article {
            id: ArticleId::generate(),
            title: "상가 권리금, 이렇게 확인하세요".to_string(),
            category: "guide".to_string(),
            summary: "계약 전 꼭 챙겨야 할 권리금 체크포인트".to_string(),
            body: "권리금 계약서와 임대차 계약서를 함께 검토해야 합니다.".to_string(),
            thumbnail_url: None,
            published: true,
            published_at: Some(now - Duration::days(10)),
            view_count: Some(128),
            created_at: Some(now - Duration::days(11)),
            updated_at: Some(now - Duration::days(10)),
        },
        Article {
            id: ArticleId::generate(),
            title: "하반기 오피스 공실률 전망".to_string(),
            category: "news".to_string(),
            summary: String::new(),
            body: "초안".to_string(),
            thumbnail_url: None,
            published: false,
            published_at: None,
            view_count: Some(0),
            created_at: Some(now - Duration::days(1)),
            updated_at: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shopspace::listings::{count_by_tab, days_until_purge};

    #[test]
    fn demo_catalog_covers_every_purge_urgency() {
        let now = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).single().expect("valid");
        let listings = demo_listings(now);
        let counts = count_by_tab(&listings);
        assert_eq!(counts.all, 3);
        assert_eq!(counts.deleted, 3);

        let mut countdowns: Vec<i64> = listings
            .iter()
            .filter_map(|listing| days_until_purge(listing.deleted_at, now))
            .collect();
        countdowns.sort_unstable();
        assert_eq!(countdowns, vec![-4, 4, 27]);
    }

    #[test]
    fn timestamps_parse_as_rfc3339() {
        let parsed = parse_timestamp("2025-01-31T09:00:00+09:00").expect("valid");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).single().expect("valid"));
        assert!(parse_timestamp("yesterday").is_err());
    }
}
