//! Identifier matching between caller-supplied targets and remote inventory.
//!
//! Update targets are usually `directory/file.php` paths, but different
//! Remote Manager plugin versions report installed plugins under different
//! fields (canonical path, `plugin_file`, slug, display name), and some only
//! expose a display name that has to be cross-referenced through the updates
//! listing. The rules below are tried in order across the whole inventory;
//! the first hit wins. A miss is "not found", never an error.

use super::models::{PluginInfo, PluginUpdateRef, ThemeInfo};

/// Locate a plugin in the remote inventory by any known identifier form.
///
/// `updates` is the plugins section of the `/updates` payload; it may be
/// empty, in which case the cross-reference rule is skipped.
pub fn locate_plugin<'a>(
    target: &str,
    inventory: &'a [PluginInfo],
    updates: &[PluginUpdateRef],
) -> Option<&'a PluginInfo> {
    if target.is_empty() {
        return None;
    }

    // (a) exact match on canonical path, display name, or slug
    if let Some(item) = inventory
        .iter()
        .find(|p| p.plugin == target || p.name == target || p.slug.as_deref() == Some(target))
    {
        return Some(item);
    }

    // (b) alternate plugin_file field
    if let Some(item) = inventory
        .iter()
        .find(|p| p.plugin_file.as_deref() == Some(target))
    {
        return Some(item);
    }

    // (c) cross-reference through the updates listing, which maps display
    // names to file paths
    for entry in updates {
        let path_matches = entry.plugin.as_deref() == Some(target);
        let name_matches = !entry.name.is_empty() && entry.name == target;
        if !path_matches && !name_matches {
            continue;
        }
        if let Some(item) = inventory.iter().find(|p| {
            (!entry.name.is_empty() && p.name == entry.name)
                || (!p.plugin.is_empty() && entry.plugin.as_deref() == Some(p.plugin.as_str()))
        }) {
            return Some(item);
        }
    }

    // (d) directory prefix vs display name, case- and hyphen-insensitive
    if let Some((directory, _)) = target.split_once('/') {
        let needle = fold(directory);
        if !needle.is_empty() {
            if let Some(item) = inventory.iter().find(|p| fold(&p.name).contains(&needle)) {
                return Some(item);
            }
        }
    }

    // (e) substring containment either direction between target and path
    if let Some(item) = inventory.iter().find(|p| {
        !p.plugin.is_empty() && (p.plugin.contains(target) || target.contains(&p.plugin))
    }) {
        return Some(item);
    }

    // (f) slug equality after stripping the /file.php suffix from both sides
    let target_slug = path_slug(target);
    inventory
        .iter()
        .find(|p| !p.plugin.is_empty() && path_slug(&p.plugin) == target_slug)
}

/// Theme lookup is simpler: the stylesheet (directory name) is the stable
/// identifier, with slug and display name as fallbacks.
pub fn locate_theme<'a>(target: &str, inventory: &'a [ThemeInfo]) -> Option<&'a ThemeInfo> {
    if target.is_empty() {
        return None;
    }
    inventory.iter().find(|t| {
        t.stylesheet == target || t.slug.as_deref() == Some(target) || t.name == target
    })
}

fn fold(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '-' && *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn path_slug(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(path: &str, name: &str, version: &str) -> PluginInfo {
        PluginInfo {
            plugin: path.to_string(),
            plugin_file: None,
            name: name.to_string(),
            slug: None,
            version: version.to_string(),
            active: true,
        }
    }

    #[test]
    fn test_exact_path_match() {
        let inventory = vec![plugin("akismet/akismet.php", "Akismet", "5.3")];
        let found = locate_plugin("akismet/akismet.php", &inventory, &[]).unwrap();
        assert_eq!(found.name, "Akismet");
    }

    #[test]
    fn test_display_name_match() {
        let inventory = vec![plugin("akismet/akismet.php", "Akismet", "5.3")];
        assert!(locate_plugin("Akismet", &inventory, &[]).is_some());
    }

    #[test]
    fn test_plugin_file_field_match() {
        // Some responses omit the canonical path and only carry plugin_file.
        let inventory = vec![PluginInfo {
            plugin: String::new(),
            plugin_file: Some("duplicate-post/duplicate-post.php".to_string()),
            name: "Duplicate Post".to_string(),
            slug: None,
            version: "4.5".to_string(),
            active: true,
        }];
        let found =
            locate_plugin("duplicate-post/duplicate-post.php", &inventory, &[]).unwrap();
        assert_eq!(found.name, "Duplicate Post");
    }

    #[test]
    fn test_updates_cross_reference() {
        let inventory = vec![plugin("", "Yoast SEO", "21.0")];
        let updates = vec![PluginUpdateRef {
            name: "Yoast SEO".to_string(),
            plugin: Some("wordpress-seo/wp-seo.php".to_string()),
            ..Default::default()
        }];
        let found = locate_plugin("wordpress-seo/wp-seo.php", &inventory, &updates).unwrap();
        assert_eq!(found.name, "Yoast SEO");
    }

    #[test]
    fn test_directory_prefix_against_name() {
        let inventory = vec![plugin("", "WP Super Cache", "1.12")];
        assert!(locate_plugin("wp-super-cache/wp-cache.php", &inventory, &[]).is_some());
    }

    #[test]
    fn test_substring_containment() {
        let inventory = vec![plugin("contact-form-7/wp-contact-form-7.php", "Contact Form 7", "5.9")];
        assert!(locate_plugin("contact-form-7", &inventory, &[]).is_some());
    }

    #[test]
    fn test_slug_equality_after_stripping_file() {
        let inventory = vec![plugin("jetpack/jetpack-loader.php", "Jetpack", "13.0")];
        assert!(locate_plugin("jetpack/jetpack.php", &inventory, &[]).is_some());
    }

    #[test]
    fn test_no_match_is_none() {
        let inventory = vec![plugin("akismet/akismet.php", "Akismet", "5.3")];
        assert!(locate_plugin("hello-dolly/hello.php", &inventory, &[]).is_none());
    }

    #[test]
    fn test_empty_target() {
        let inventory = vec![plugin("akismet/akismet.php", "Akismet", "5.3")];
        assert!(locate_plugin("", &inventory, &[]).is_none());
    }

    #[test]
    fn test_empty_paths_never_match_by_substring() {
        // An inventory item with no path data must not win via containment.
        let inventory = vec![plugin("", "Mystery", "1.0")];
        assert!(locate_plugin("akismet/akismet.php", &inventory, &[]).is_none());
    }

    #[test]
    fn test_theme_stylesheet_match() {
        let inventory = vec![ThemeInfo {
            stylesheet: "twentytwentyfour".to_string(),
            slug: None,
            name: "Twenty Twenty-Four".to_string(),
            version: "1.1".to_string(),
            active: false,
        }];
        assert!(locate_theme("twentytwentyfour", &inventory).is_some());
        assert!(locate_theme("Twenty Twenty-Four", &inventory).is_some());
        assert!(locate_theme("astra", &inventory).is_none());
    }
}
