use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::CategoryGroup;

static STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\[\]'"]+"#).unwrap());
static WORD_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w").unwrap());

/// Canonical form of a raw category/aspect token: NFC fold, strip bracket and
/// quote characters left over from list encoding, lowercase, trim.
pub fn normalize(raw: &str) -> String {
    let folded: String = raw.nfc().collect();
    STRIP_RE
        .replace_all(&folded, "")
        .to_lowercase()
        .trim()
        .to_string()
}

/// Display form: first letter of every word upper-cased.
pub fn title_case(text: &str) -> String {
    WORD_START_RE
        .replace_all(text, |caps: &regex::Captures| caps[0].to_uppercase())
        .to_string()
}

/// One predicate of the classification table, checked against the normalized
/// token.
#[derive(Debug, Clone, Copy)]
pub enum TokenRule {
    Prefix(&'static str),
    Contains(&'static str),
}

impl TokenRule {
    fn matches(&self, token: &str) -> bool {
        match self {
            TokenRule::Prefix(p) => token.starts_with(p),
            TokenRule::Contains(n) => token.contains(n),
        }
    }
}

use TokenRule::{Contains, Prefix};

/// Ordered rule table, first match wins. Rules are not mutually exclusive
/// (e.g. "support#system_ui" matches both the support# and system_ui rules),
/// so evaluation order is part of the contract and lives here as data, not
/// control flow.
pub static CLASSIFICATION_RULES: &[(CategoryGroup, &[TokenRule])] = &[
    (
        CategoryGroup::AppExperience,
        &[
            Prefix("app#"),
            // the app# variants the source taxonomy enumerates; the bare
            // prefix above already covers them
            Prefix("app#general"),
            Prefix("app#performance"),
            Prefix("app#usability"),
            Prefix("app#features"),
            Prefix("app#tablet"),
            Prefix("app#design"),
            Prefix("app#cost"),
            Prefix("app#quality"),
            Prefix("app#pricing"),
        ],
    ),
    (
        CategoryGroup::CustomerSupport,
        &[
            Prefix("support#"),
            Contains("customer_support"),
            Contains("card_settings_support"),
        ],
    ),
    (CategoryGroup::BranchService, &[Prefix("branch")]),
    (CategoryGroup::AtmService, &[Prefix("atm")]),
    (CategoryGroup::BiometricIssues, &[Prefix("biometric")]),
    (CategoryGroup::SystemPerformance, &[Prefix("system#")]),
    (CategoryGroup::UiScreenIssues, &[Prefix("screen#")]),
    (
        CategoryGroup::DesignUx,
        &[
            Prefix("ui_ux#"),
            Contains("ui_font"),
            Contains("system_ui"),
            Contains("ui_color"),
        ],
    ),
    (
        CategoryGroup::ChargesFees,
        &[Prefix("fees"), Prefix("charges"), Prefix("tax")],
    ),
    (
        CategoryGroup::LocationIssues,
        &[Prefix("location"), Prefix("lighting")],
    ),
    (
        CategoryGroup::DigitalServices,
        &[Prefix("email"), Prefix("sms"), Prefix("digital_currency")],
    ),
    (
        CategoryGroup::AccountTransactions,
        &[
            Prefix("transaction"),
            Prefix("payment"),
            Prefix("balance"),
            Prefix("login_security"),
            Prefix("password"),
            Prefix("account_recovery"),
        ],
    ),
];

/// Map a raw category token to its group. Total: unmatched tokens are
/// `Others`, never an error.
pub fn classify(raw: &str) -> CategoryGroup {
    let token = normalize(raw);
    for (group, rules) in CLASSIFICATION_RULES {
        if rules.iter().any(|r| r.matches(&token)) {
            return *group;
        }
    }
    CategoryGroup::Others
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_list_leftovers() {
        assert_eq!(normalize("['app#performance']"), "app#performance");
        assert_eq!(normalize("  \"Branch_Wait\" "), "branch_wait");
        assert_eq!(normalize("UI"), "ui");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn title_case_uppercases_every_word_start() {
        assert_eq!(title_case("app experience"), "App Experience");
        assert_eq!(title_case("ui"), "Ui");
        assert_eq!(title_case("slow login screen"), "Slow Login Screen");
        assert_eq!(title_case("easy-to-use"), "Easy-To-Use");
    }

    #[test]
    fn classify_covers_every_group() {
        let cases = [
            ("app#performance", CategoryGroup::AppExperience),
            ("support#general", CategoryGroup::CustomerSupport),
            ("customer_support_rude", CategoryGroup::CustomerSupport),
            ("card_settings_support", CategoryGroup::CustomerSupport),
            ("branch_wait_time", CategoryGroup::BranchService),
            ("atm_out_of_cash", CategoryGroup::AtmService),
            ("biometric_login_fail", CategoryGroup::BiometricIssues),
            ("system#downtime", CategoryGroup::SystemPerformance),
            ("screen#freeze", CategoryGroup::UiScreenIssues),
            ("ui_ux#layout", CategoryGroup::DesignUx),
            ("bad_ui_font", CategoryGroup::DesignUx),
            ("system_ui_glitch", CategoryGroup::DesignUx),
            ("fees_hidden", CategoryGroup::ChargesFees),
            ("charges_unexpected", CategoryGroup::ChargesFees),
            ("tax_deduction", CategoryGroup::ChargesFees),
            ("location_far", CategoryGroup::LocationIssues),
            ("lighting_poor", CategoryGroup::LocationIssues),
            ("email_alerts", CategoryGroup::DigitalServices),
            ("sms_otp_delay", CategoryGroup::DigitalServices),
            ("digital_currency", CategoryGroup::DigitalServices),
            ("transaction_failed", CategoryGroup::AccountTransactions),
            ("payment_stuck", CategoryGroup::AccountTransactions),
            ("balance_wrong", CategoryGroup::AccountTransactions),
            ("login_security", CategoryGroup::AccountTransactions),
            ("password_reset", CategoryGroup::AccountTransactions),
            ("account_recovery_slow", CategoryGroup::AccountTransactions),
            ("foo_bar", CategoryGroup::Others),
            ("", CategoryGroup::Others),
        ];
        for (token, want) in cases {
            assert_eq!(classify(token), want, "token {token:?}");
        }
    }

    #[test]
    fn classify_is_case_insensitive_and_quote_tolerant() {
        assert_eq!(classify("ATM_withdrawal"), CategoryGroup::AtmService);
        assert_eq!(classify("'Branch_Crowded'"), CategoryGroup::BranchService);
        assert_eq!(classify("[\"APP#Updates\"]"), CategoryGroup::AppExperience);
    }

    #[test]
    fn rule_order_breaks_overlaps() {
        // tokens matching several rule families resolve to the earliest rule
        assert_eq!(classify("support#system_ui"), CategoryGroup::CustomerSupport);
        assert_eq!(
            classify("atm_card_settings_support"),
            CategoryGroup::CustomerSupport
        );
        assert_eq!(classify("app#tax_module"), CategoryGroup::AppExperience);
        assert_eq!(classify("tax_app#screen"), CategoryGroup::ChargesFees);
    }

    #[test]
    fn system_prefix_requires_the_hash() {
        // plain "system_ui" belongs to Design/UX, not System Performance
        assert_eq!(classify("system_ui"), CategoryGroup::DesignUx);
        assert_eq!(classify("system#lag"), CategoryGroup::SystemPerformance);
    }
}
