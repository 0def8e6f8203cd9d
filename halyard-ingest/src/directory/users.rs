//! Parsing and normalization of the Active Directory users export.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::IngestError;

/// A user row as it appears in the raw export.
///
/// The export carries LDAP attribute names; missing columns deserialize
/// to empty strings so a partial export degrades instead of failing.
#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(rename = "userPrincipalName", default)]
    user_principal_name: String,
    #[serde(rename = "employeeID", default)]
    employee_id: String,
    #[serde(rename = "givenName", default)]
    given_name: String,
    #[serde(rename = "sn", default)]
    surname: String,
    #[serde(rename = "displayName", default)]
    display_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    mail: String,
    #[serde(rename = "telephoneNumber", default)]
    telephone_number: String,
    #[serde(default)]
    mobile: String,
    #[serde(default)]
    manager: String,
    #[serde(rename = "memberOf", default)]
    member_of: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    division: String,
}

/// A normalized directory user as persisted in `directory_users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdUser {
    /// Short account name: the local part of the principal name,
    /// lower-cased. Doubles as the unique key for the record.
    pub account: String,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub title: String,
    pub email: String,
    pub office_phone: String,
    pub mobile_phone: String,
    /// The manager's short account name, extracted from the manager DN.
    pub manager: String,
    pub department: String,
    pub division: String,
    /// Security group names the user belongs to, Exchange groups excluded.
    pub security_groups: Vec<String>,
}

/// Parse the users export, skipping rows without a principal name.
///
/// Rows lacking `userPrincipalName` have no usable unique key, so they
/// are dropped rather than half-imported.
pub(crate) fn parse_users_csv(path: &Path) -> Result<Vec<AdUser>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut users = Vec::new();
    for row in reader.deserialize::<RawUser>() {
        let raw = row?;
        let Some(account) = account_from_principal(&raw.user_principal_name) else {
            continue;
        };

        users.push(AdUser {
            account,
            employee_id: raw.employee_id,
            first_name: raw.given_name,
            last_name: raw.surname,
            display_name: raw.display_name,
            title: raw.title,
            email: raw.mail,
            office_phone: raw.telephone_number,
            mobile_phone: raw.mobile,
            manager: manager_account(&raw.manager),
            department: raw.department,
            division: raw.division,
            security_groups: security_groups(&raw.member_of),
        });
    }

    Ok(users)
}

/// Regroup users into division -> department -> users.
///
/// Users missing either field are left out; they have nowhere to hang in
/// the hierarchy.
#[must_use]
pub fn group_by_division_department(
    users: &[AdUser],
) -> BTreeMap<String, BTreeMap<String, Vec<AdUser>>> {
    let mut grouped: BTreeMap<String, BTreeMap<String, Vec<AdUser>>> = BTreeMap::new();

    for user in users {
        if user.division.is_empty() || user.department.is_empty() {
            continue;
        }
        grouped
            .entry(user.division.clone())
            .or_default()
            .entry(user.department.clone())
            .or_default()
            .push(user.clone());
    }

    grouped
}

/// Lower-cased local part of a principal name, or `None` for blank input.
fn account_from_principal(principal: &str) -> Option<String> {
    let lower = principal.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    Some(
        lower
            .split('@')
            .next()
            .unwrap_or(lower.as_str())
            .to_string(),
    )
}

/// Extract the manager's account from a distinguished name like
/// `CN=bsmith,OU=Staff,DC=example,DC=org`.
fn manager_account(dn: &str) -> String {
    dn.split(',')
        .next()
        .and_then(cn_value)
        .unwrap_or_default()
        .to_lowercase()
}

/// Split a `memberOf` attribute (DNs joined by `;`) into group names,
/// dropping Exchange distribution groups.
fn security_groups(member_of: &str) -> Vec<String> {
    member_of
        .split(';')
        .filter_map(|dn| {
            let mut components = dn.split(',');
            let first = components.next()?;
            let container = components.next().unwrap_or_default();
            if container.contains("Exchange") {
                return None;
            }
            cn_value(first).map(str::to_string)
        })
        .collect()
}

/// The value of a `CN=` DN component, matched case-insensitively.
fn cn_value(component: &str) -> Option<&str> {
    let trimmed = component.trim();
    let prefix = trimmed.get(..3)?;
    if !prefix.eq_ignore_ascii_case("cn=") {
        return None;
    }
    Some(&trimmed[3..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_is_the_lowercased_local_part() {
        assert_eq!(
            account_from_principal("ADoe@example.org"),
            Some("adoe".to_string())
        );
        assert_eq!(
            account_from_principal("plain-account"),
            Some("plain-account".to_string())
        );
        assert_eq!(account_from_principal("   "), None);
        assert_eq!(account_from_principal(""), None);
    }

    #[test]
    fn manager_comes_from_the_first_cn_component() {
        assert_eq!(
            manager_account("CN=BOrder,OU=Staff,DC=example,DC=org"),
            "border"
        );
        assert_eq!(manager_account("cn=already-lower,OU=Staff"), "already-lower");
        assert_eq!(manager_account("OU=NoManagerHere"), "");
        assert_eq!(manager_account(""), "");
    }

    #[test]
    fn exchange_groups_are_filtered_out() {
        let member_of = "CN=Museum Staff,OU=Groups,DC=example,DC=org;\
                         CN=All Mailboxes,OU=Exchange Groups,DC=example,DC=org;\
                         CN=Volunteers,OU=Groups,DC=example,DC=org";
        assert_eq!(
            security_groups(member_of),
            vec!["Museum Staff".to_string(), "Volunteers".to_string()]
        );
    }

    #[test]
    fn empty_member_of_yields_no_groups() {
        assert!(security_groups("").is_empty());
    }

    #[test]
    fn grouping_skips_users_without_division_or_department() {
        let users = vec![
            AdUser {
                account: "adoe".into(),
                division: "Education".into(),
                department: "Programs".into(),
                ..AdUser::default()
            },
            AdUser {
                account: "bsmith".into(),
                division: "Education".into(),
                department: "Programs".into(),
                ..AdUser::default()
            },
            AdUser {
                account: "contractor".into(),
                // no division or department
                ..AdUser::default()
            },
        ];

        let grouped = group_by_division_department(&users);

        assert_eq!(grouped.len(), 1);
        let programs = &grouped["Education"]["Programs"];
        assert_eq!(programs.len(), 2);
        assert!(
            !grouped
                .values()
                .flat_map(BTreeMap::values)
                .flatten()
                .any(|u| u.account == "contractor")
        );
    }
}
