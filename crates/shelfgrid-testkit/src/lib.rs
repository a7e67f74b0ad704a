// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Map, Value, json};

const BRANDS: [&str; 12] = [
    "Arctic", "Bosch", "Philips", "Tefal", "Xiaomi", "Samsung", "Braun", "Rowenta", "Dyson",
    "Heinner", "Beko", "Gorenje",
];

const PRODUCT_NOUNS: [&str; 14] = [
    "Blender",
    "Air Fryer",
    "Kettle",
    "Toaster",
    "Vacuum Cleaner",
    "Steam Iron",
    "Hair Dryer",
    "Coffee Maker",
    "Rice Cooker",
    "Stand Mixer",
    "Humidifier",
    "Desk Fan",
    "Juicer",
    "Food Processor",
];

const ADJECTIVES: [&str; 10] = [
    "Pro", "Compact", "Smart", "Classic", "Ultra", "Mini", "Max", "Silent", "Turbo", "Eco",
];

const CATEGORIES: [(&str, &str, &str); 6] = [
    ("家电", "厨房电器", "搅拌机"),
    ("家电", "厨房电器", "电水壶"),
    ("家电", "清洁电器", "吸尘器"),
    ("家电", "个护电器", "吹风机"),
    ("家电", "环境电器", "加湿器"),
    ("家居", "厨房用品", "料理机"),
];

const BADGES: [&str; 6] = [
    "Top Favorite",
    "Super Pret",
    "Oferta zilei",
    "Resigilat",
    "Livrare rapida",
    "",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic marketplace product rows, shaped like a spreadsheet import.
#[derive(Debug, Clone)]
pub struct ProductFaker {
    rng: DeterministicRng,
}

impl ProductFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }

    fn int_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        min + self.int_n(max - min + 1)
    }

    /// Price in cents rendered the way marketplace exports mix formats.
    fn price_text(&mut self, cents: usize) -> String {
        let whole = cents / 100;
        let fraction = cents % 100;
        match self.int_n(4) {
            0 => format!("{whole},{fraction:02} Lei"),
            1 => format!("{whole}.{fraction:02}"),
            2 if whole >= 1000 => format!("{}.{:03},{fraction:02} lei", whole / 1000, whole % 1000),
            _ => format!("{whole},{fraction:02}"),
        }
    }

    /// One product record; `index` feeds the title and code so rows stay distinct.
    pub fn product(&mut self, index: usize) -> Map<String, Value> {
        let brand = self.pick(&BRANDS);
        let noun = self.pick(&PRODUCT_NOUNS);
        let adjective = self.pick(&ADJECTIVES);
        let (first, second, third) = CATEGORIES[self.int_n(CATEGORIES.len())];

        let prp_cents = self.int_range(4_000, 250_000);
        let discount = self.int_range(0, 45);
        let price_cents = prp_cents * (100 - discount) / 100;
        let prp = self.price_text(prp_cents);
        let price = if self.int_n(40) == 0 {
            "N/A".to_owned()
        } else {
            self.price_text(price_cents)
        };

        let rating = match self.int_n(10) {
            0 => Value::String(String::new()),
            1 => Value::String(format!("0.{}", self.int_range(50, 99))),
            _ => Value::String(format!("{}%", self.int_range(40, 100))),
        };
        let score = format!("{}.{}", self.int_range(2, 4), self.int_n(10));
        let reviews = self.int_range(0, 4_000);
        let badge = self.pick(&BADGES);
        let pnk = format!("D{:02}{:06}", self.int_n(100), index);

        let value = json!({
            "产品图片": format!("https://img.example.test/p/{pnk}.jpg"),
            "产品标题": format!("{brand} {noun} {adjective} {index}"),
            "PRP原价": prp,
            "前端价格": price,
            "前端折扣": format!("-{discount}%"),
            "星级值": rating,
            "评论分数": score,
            "评价数量": reviews,
            "链接打标": badge,
            "PNK码": pnk,
            "产品链接": format!("https://shop.example.test/pd/{pnk}"),
            "一级类": first,
            "二级类": second,
            "三级类": third,
            "品牌": brand,
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn products(&mut self, count: usize) -> Vec<Map<String, Value>> {
        (0..count).map(|index| self.product(index)).collect()
    }
}

/// `count` products from a fixed seed.
pub fn sample_products(count: usize) -> Vec<Map<String, Value>> {
    ProductFaker::new(7).products(count)
}

/// Object literal to record; anything else becomes an empty record.
pub fn record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Records with only a title and a price, for precise pipeline checks.
pub fn priced_titles(rows: &[(&str, &str)]) -> Vec<Map<String, Value>> {
    rows.iter()
        .map(|(title, price)| record(json!({ "产品标题": title, "前端价格": price })))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ProductFaker, priced_titles, record, sample_products};
    use serde_json::json;

    #[test]
    fn same_seed_same_products() {
        let mut left = ProductFaker::new(42);
        let mut right = ProductFaker::new(42);
        assert_eq!(left.products(20), right.products(20));
    }

    #[test]
    fn zero_seed_is_normalized() {
        let mut zero = ProductFaker::new(0);
        let mut one = ProductFaker::new(1);
        assert_eq!(zero.product(0), one.product(0));
    }

    #[test]
    fn product_has_import_headers_in_order() {
        let rows = sample_products(1);
        let headers: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(headers.first(), Some(&"产品图片"));
        assert_eq!(headers.last(), Some(&"品牌"));
        assert_eq!(headers.len(), 15);
    }

    #[test]
    fn titles_and_codes_are_unique() {
        let rows = sample_products(300);
        let mut codes: Vec<&str> = rows
            .iter()
            .filter_map(|row| row.get("PNK码").and_then(|value| value.as_str()))
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 300);
    }

    #[test]
    fn dataset_mixes_price_formats() {
        let rows = sample_products(400);
        let prices: Vec<&str> = rows
            .iter()
            .filter_map(|row| row.get("前端价格").and_then(|value| value.as_str()))
            .collect();
        assert!(prices.iter().any(|price| price.ends_with("Lei")));
        assert!(prices.iter().any(|price| price.contains('.') && !price.contains(',')));
        assert!(prices.iter().any(|price| *price == "N/A"));
    }

    #[test]
    fn record_helpers() {
        assert!(record(json!([1, 2])).is_empty());
        let rows = priced_titles(&[("Abcdef Pro", "54,93 Lei")]);
        assert_eq!(rows[0]["产品标题"], "Abcdef Pro");
    }
}
