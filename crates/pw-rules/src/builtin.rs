//! Built-in rule data
//!
//! Ships the default WeChat/Alipay interception set plus site sets for the
//! portals that push app handoff hardest. Embedders with their own rule
//! files never touch this; the CLI and the wasm bundle fall back to it.

use pw_core::rules::Registry;

use crate::compile::{load_rules, LoadError, LoadReport};

/// The built-in rule file, same JSON format as user-supplied rules.
pub const BUILTIN_RULES: &str = r#"{
    "default": {
        "id": "default",
        "selectors": [
            ".app-download", ".download-app", ".app-banner", ".download-banner",
            ".app-popup", ".download-popup", ".app-modal", ".download-modal"
        ],
        "schemes": [
            "weixin://", "com.tencent.mm://", "wechat://", "wework://",
            "wxpay://", "com.tencent.wechatpay://",
            "alipay://", "com.eg.android.AlipayGphone://", "alipayqr://"
        ],
        "patterns": [
            "weixin://[^\"'\\s]+",
            "alipay://[^\"'\\s]+",
            "wxpay://[^\"'\\s]+",
            "window\\.(openWeChat|openAlipay|wechatApp|alipayApp)\\(",
            "打开微信",
            "打开支付宝"
        ],
        "functions": [
            "openApp", "launchApp", "downloadApp", "callApp",
            "openWeChat", "openAlipay", "wechatApp", "alipayApp"
        ]
    },
    "sites": [
        {
            "id": "weibo",
            "matchDomains": ["weibo.com"],
            "selectors": [
                ".app-download", ".weibo-app", ".download-banner",
                ".app-promotion", ".download-modal"
            ],
            "schemes": ["weibo://", "sinaweibo://"],
            "patterns": [
                "weibo://[^\"'\\s]+",
                "sinaweibo://[^\"'\\s]+",
                "window\\.openWeibo\\(",
                "location\\.href\\s*=\\s*['\"`]weibo://"
            ],
            "functions": ["openWeibo", "weiboApp", "sinaWeibo"]
        },
        {
            "id": "bilibili",
            "matchDomains": ["bilibili.com"],
            "selectors": [
                ".app-download", ".bili-app", ".download-banner",
                ".app-promotion", ".download-modal", ".app-popup"
            ],
            "schemes": ["bilibili://", "com.bilibili.app://"],
            "patterns": [
                "bilibili://[^\"'\\s]+",
                "com\\.bilibili\\.app://[^\"'\\s]+",
                "window\\.openBiliApp\\(",
                "location\\.href\\s*=\\s*['\"`]bilibili://"
            ],
            "functions": ["openBiliApp", "biliApp", "bililive"]
        }
    ]
}"#;

/// Registry over [`BUILTIN_RULES`].
pub fn builtin_registry() -> Result<(Registry, LoadReport), LoadError> {
    load_rules(BUILTIN_RULES)
}
