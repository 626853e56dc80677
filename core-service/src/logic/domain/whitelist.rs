//! Reputation tables for the domain analyzer.

/// TLDs that only vetted institutions can register
pub const TRUSTED_TLDS: &[&str] = &[".gov", ".edu", ".mil"];

/// Curated high-trust registrable domains
pub const HIGH_TRUST_DOMAINS: &[&str] = &[
    // Search engines & tech
    "google.com", "google.co.in", "google.co.jp", "google.co.uk", "google.de",
    "google.fr", "google.com.br", "google.it", "google.es", "google.ca",
    "google.com.au", "google.ru", "google.pl", "google.nl", "google.co.id",
    "bing.com", "yahoo.com", "duckduckgo.com", "baidu.com", "yandex.ru",

    // Social
    "facebook.com", "twitter.com", "instagram.com", "linkedin.com",
    "reddit.com", "pinterest.com", "tumblr.com", "snapchat.com",
    "tiktok.com", "vk.com", "weibo.com", "whatsapp.com",

    // E-commerce
    "amazon.com", "amazon.co.uk", "amazon.de", "amazon.fr", "amazon.co.jp",
    "ebay.com", "alibaba.com", "taobao.com", "tmall.com", "aliexpress.com",
    "walmart.com", "target.com", "bestbuy.com", "etsy.com", "shopify.com",

    // Microsoft
    "microsoft.com", "live.com", "outlook.com", "office.com", "msn.com",
    "windows.com", "xbox.com", "skype.com",

    // Media
    "youtube.com", "netflix.com", "twitch.tv", "spotify.com", "soundcloud.com",
    "imdb.com", "cnn.com", "bbc.com", "nytimes.com", "theguardian.com",
    "forbes.com", "bloomberg.com", "reuters.com", "espn.com",

    // Chinese sites
    "qq.com", "sohu.com", "sina.com.cn", "163.com", "360.cn",
    "jd.com", "bilibili.com", "zhihu.com", "douban.com",

    // Cloud & CDN
    "cloudflare.com", "amazonaws.com", "googleusercontent.com",
    "cloudfront.net", "akamai.net", "fastly.net", "cdn.jsdelivr.net",

    // Finance
    "paypal.com", "chase.com", "bankofamerica.com", "wellsfargo.com",
    "citibank.com", "hsbc.com", "visa.com", "mastercard.com",

    // Education & knowledge
    "wikipedia.org", "wikimedia.org", "stackoverflow.com", "github.com",
    "gitlab.com", "bitbucket.org", "medium.com", "wordpress.com",
    "leetcode.com", "hackerrank.com", "geeksforgeeks.org",

    // Government & organizations
    "gov.uk", "gov.in", "gov.au", "gov.ca",
    "europa.eu", "un.org", "who.int", "unesco.org",

    // Services
    "dropbox.com", "zoom.us", "slack.com", "discord.com", "telegram.org",
    "apple.com", "icloud.com", "adobe.com", "salesforce.com",
    "canva.com", "notion.so", "trello.com", "asana.com",

    // Travel & maps
    "booking.com", "airbnb.com", "expedia.com", "tripadvisor.com",
    "maps.google.com", "maps.apple.com", "waze.com",

    // Others
    "archive.org", "craigslist.org", "flickr.com", "vimeo.com",
    "dailymotion.com", "blogger.com", "wordpress.org",
];

/// Words phishers put in hostnames
pub const PHISHING_KEYWORDS: &[&str] = &[
    "login", "verify", "secure", "account", "update", "confirm",
    "banking", "payment", "wallet", "credential", "password",
];

/// Brand token -> domains authorized to carry it
pub const BRAND_PATTERNS: &[(&str, &[&str])] = &[
    ("google", &["google.com", "google.co", "accounts.google.com", "drive.google.com", "docs.google.com"]),
    ("paypal", &["paypal.com", "paypal.me", "paypal.co"]),
    ("amazon", &["amazon.com", "amazon.co", "aws.amazon.com"]),
    ("facebook", &["facebook.com", "fb.com", "messenger.com"]),
    ("instagram", &["instagram.com"]),
    ("microsoft", &["microsoft.com", "office.com", "live.com", "outlook.com", "azure.com"]),
    ("apple", &["apple.com", "icloud.com"]),
    ("netflix", &["netflix.com"]),
    ("linkedin", &["linkedin.com"]),
    ("chase", &["chase.com"]),
    ("wellsfargo", &["wellsfargo.com"]),
];
