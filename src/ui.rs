use crate::admin::AdminGate;
use crate::models::{BoardStats, Hit, HitType, Notice, NoticeLevel};
use crate::stats::most_common_label;
use chrono::{DateTime, Utc};

/// Which admin dialog, if any, is open on top of the board.
pub enum Modal<'a> {
    Closed,
    Login,
    Edit(&'a Hit),
}

pub struct PageView<'a> {
    pub hits: &'a [Hit],
    pub gate: AdminGate,
    pub stats: &'a BoardStats,
    pub notices: &'a [Notice],
    pub modal: Modal<'a>,
    pub now: DateTime<Utc>,
}

pub fn render_index(view: &PageView<'_>) -> String {
    let is_admin = view.gate.is_admin();
    let admin_buttons = if is_admin {
        r#"<form method="post" action="/admin/logout"><button class="ghost-btn" type="submit">Log out</button></form>"#
            .to_string()
    } else {
        r#"<a class="ghost-btn" href="/board?view=admin">Admin</a>"#.to_string()
    };

    fill(
        INDEX_HTML,
        &[
            ("ADMIN_STATUS", view.gate.label().to_string()),
            ("ADMIN_BUTTONS", admin_buttons),
            ("TOTAL_HITS", view.stats.total_hits.to_string()),
            ("AVG_RATING", format!("{:.1}", view.stats.average_rating)),
            ("COMMON_TYPE", escape_html(most_common_label(view.stats))),
            ("TYPE_OPTIONS", type_options("slap")),
            ("HITS", render_hits(view.hits, is_admin, view.now)),
            ("MODAL", render_modal(&view.modal, is_admin)),
            ("TOASTS", render_toasts(view.notices)),
        ],
    )
}

pub fn render_hits(hits: &[Hit], is_admin: bool, now: DateTime<Utc>) -> String {
    if hits.is_empty() {
        return r#"<div class="empty-state">
          <h4>No hits yet!</h4>
          <p>Submit the first hit to get started.</p>
        </div>"#
            .to_string();
    }

    hits.iter()
        .map(|hit| render_hit_card(hit, is_admin, now))
        .collect()
}

pub fn render_hit_card(hit: &Hit, is_admin: bool, now: DateTime<Utc>) -> String {
    let hit_type = hit.hit_type();
    let description = match hit.description.as_deref() {
        Some(text) if !text.is_empty() => {
            format!(r#"<div class="hit-description">{}</div>"#, escape_html(text))
        }
        _ => String::new(),
    };
    let count = if hit.ratings.is_empty() {
        "No ratings yet".to_string()
    } else {
        format!("{} ratings • {:.1}", hit.ratings.len(), hit.average_rating)
    };
    let admin_controls = if is_admin {
        format!(
            r#"<div class="admin-actions">
              <form method="post" action="/hits/{id}/edit">
                <button class="admin-action-btn" type="submit">Edit</button>
              </form>
              <form method="post" action="/hits/{id}/delete"
                    onsubmit="this.confirmed.value = confirm('Delete this hit?') ? 'yes' : ''; return this.confirmed.value === 'yes';">
                <input type="hidden" name="confirmed" value="" />
                <button class="admin-action-btn danger" type="submit">Delete</button>
              </form>
            </div>"#,
            id = hit.id
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="hit-card" data-hit-id="{id}">
          <div class="hit-header"><span class="hit-type">{emoji} {label}</span></div>
          <div class="hit-reason">🎯 {reason}</div>
          {description}
          <div class="hit-actions">
            <div class="hit-rating">
              {stars}
              <span class="rating-count">{count}</span>
            </div>
            {admin_controls}
          </div>
          <div class="hit-age">{age}</div>
        </div>"#,
        id = hit.id,
        emoji = hit_type.emoji(),
        label = hit_type.label(),
        reason = escape_html(&hit.reason),
        stars = render_stars(hit.id, hit.average_rating),
        age = time_ago(hit.created_at, now),
    )
}

/// Position `i` is filled iff `i <= round(average)`. Every position submits a
/// rating of `i`, whatever the current average.
pub fn render_stars(hit_id: i64, average_rating: f64) -> String {
    let filled_up_to = average_rating.round();
    let stars: String = (1..=5u8)
        .map(|i| {
            let class = if f64::from(i) <= filled_up_to { "star filled" } else { "star" };
            format!(
                r#"<button class="{class}" type="submit" name="rating" value="{i}" title="Rate {i} stars">⭐</button>"#
            )
        })
        .collect();
    format!(
        r#"<form class="rating-stars" method="post" action="/hits/{hit_id}/rate">{stars}</form>"#
    )
}

pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - created_at).num_hours();
    let days = hours / 24;
    if days > 0 {
        format!("{days} day{} ago", if days > 1 { "s" } else { "" })
    } else if hours > 0 {
        format!("{hours} hour{} ago", if hours > 1 { "s" } else { "" })
    } else {
        "Just now".to_string()
    }
}

fn render_modal(modal: &Modal<'_>, is_admin: bool) -> String {
    let body = match modal {
        Modal::Closed => return String::new(),
        Modal::Edit(hit) if is_admin => format!(
            r#"<h3>Edit hit #{id}</h3>
            <form method="post" action="/admin/edit" class="stack">
              <label>Reason <input name="reason" required value="{reason}" /></label>
              <label>Type <select name="type">{options}</select></label>
              <label>Description <textarea name="description" rows="3">{description}</textarea></label>
              <button class="primary-btn" type="submit">Save</button>
            </form>
            <form method="post" action="/admin/edit/cancel">
              <button class="ghost-btn" type="submit">Cancel</button>
            </form>"#,
            id = hit.id,
            reason = escape_html(&hit.reason),
            options = type_options(&hit.kind),
            description = escape_html(hit.description.as_deref().unwrap_or("")),
        ),
        _ if is_admin => r#"<h3>Admin</h3>
            <p>You are logged in as admin. Use the Edit and Delete buttons on each hit.</p>
            <form method="post" action="/admin/logout">
              <button class="ghost-btn" type="submit">Log out</button>
            </form>"#
            .to_string(),
        _ => r#"<h3>Admin login</h3>
            <form method="post" action="/admin/login" class="stack">
              <label>Passcode <input name="passcode" type="password" autocomplete="off" /></label>
              <button class="primary-btn" type="submit">Log in</button>
            </form>"#
            .to_string(),
    };

    format!(
        r#"<div class="modal open" aria-hidden="false">
          <div class="modal-card">
            <a class="modal-close" href="/board" aria-label="Close">×</a>
            {body}
          </div>
        </div>"#
    )
}

fn render_toasts(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| {
            let level = match notice.level {
                NoticeLevel::Success => "success",
                NoticeLevel::Error => "error",
            };
            format!(
                r#"<div class="toast toast-{level}" role="status">{}</div>"#,
                escape_html(&notice.message)
            )
        })
        .collect()
}

fn type_options(selected: &str) -> String {
    let selected = HitType::from_raw(selected);
    HitType::ALL
        .iter()
        .map(|kind| {
            format!(
                r#"<option value="{value}"{sel}>{emoji} {label}</option>"#,
                value = kind.as_str(),
                sel = if *kind == selected { " selected" } else { "" },
                emoji = kind.emoji(),
                label = kind.label(),
            )
        })
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Substitutes `{{NAME}}` placeholders in a single pass over the template, so
/// inserted values are never scanned for placeholders themselves.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Hit Board</title>
  <style>
    :root {
      --bg: #0b0f19;
      --card: rgba(15, 20, 32, 0.92);
      --ink: rgba(229, 231, 235, 0.95);
      --muted: rgba(229, 231, 235, 0.45);
      --line: rgba(255, 255, 255, 0.12);
      --accent: #f59e0b;
      --danger: #ef4444;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, #1e293b, var(--bg) 60%);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.8rem, 4vw, 2.4rem);
    }

    .admin-bar {
      display: flex;
      align-items: center;
      gap: 10px;
    }

    .admin-bar form {
      margin: 0;
    }

    .panel,
    .hit-card,
    .submit-card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 20px;
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 700;
    }

    .stack {
      display: grid;
      gap: 12px;
    }

    label {
      display: grid;
      gap: 6px;
      font-size: 0.9rem;
    }

    input,
    select,
    textarea {
      background: rgba(255, 255, 255, 0.06);
      border: 1px solid var(--line);
      border-radius: 8px;
      color: var(--ink);
      padding: 10px;
      font: inherit;
    }

    button,
    .ghost-btn,
    .admin-action-btn {
      cursor: pointer;
      font: inherit;
      text-decoration: none;
    }

    .primary-btn {
      background: var(--accent);
      color: #111827;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-weight: 700;
    }

    .ghost-btn,
    .admin-action-btn {
      display: inline-flex;
      background: transparent;
      color: var(--ink);
      border: 1px solid var(--line);
      border-radius: 999px;
      padding: 6px 14px;
    }

    .admin-action-btn.danger {
      border-color: var(--danger);
      color: var(--danger);
    }

    .hits-list {
      display: grid;
      gap: 14px;
    }

    .hit-type {
      font-size: 0.85rem;
      color: var(--accent);
      font-weight: 600;
    }

    .hit-reason {
      margin-top: 8px;
      font-size: 1.1rem;
      font-weight: 600;
    }

    .hit-description {
      margin-top: 6px;
      color: rgba(229, 231, 235, 0.75);
    }

    .hit-actions {
      margin-top: 12px;
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    .hit-rating,
    .admin-actions {
      display: flex;
      align-items: center;
      gap: 10px;
    }

    .admin-actions form,
    .rating-stars {
      margin: 0;
      display: inline-flex;
    }

    .star {
      background: none;
      border: none;
      padding: 0 2px;
      font-size: 1.3rem;
      filter: grayscale(1) opacity(0.35);
      transition: transform 120ms ease;
    }

    .star.filled {
      filter: none;
    }

    .star:hover {
      transform: scale(1.2);
    }

    .rating-count,
    .hit-age {
      font-size: 0.8rem;
      color: var(--muted);
    }

    .hit-age {
      margin-top: 0.5rem;
    }

    .empty-state {
      text-align: center;
      color: var(--muted);
      padding: 32px;
    }

    .modal {
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.6);
      display: grid;
      place-items: center;
      z-index: 900;
    }

    .modal-card {
      position: relative;
      width: min(480px, 92vw);
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 24px;
      display: grid;
      gap: 12px;
    }

    .modal-close {
      position: absolute;
      top: 10px;
      right: 14px;
      color: var(--muted);
      font-size: 1.4rem;
      text-decoration: none;
    }

    .toasts {
      position: fixed;
      top: 20px;
      right: 20px;
      display: grid;
      gap: 8px;
      z-index: 1000;
    }

    .toast {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 8px;
      padding: 1rem 1.5rem;
      font-weight: 600;
      box-shadow: 0 10px 30px rgba(0, 0, 0, 0.55);
      animation: slideIn 0.3s ease;
    }

    .toast-error {
      border-color: var(--danger);
    }

    .toast.leaving {
      animation: slideOut 0.3s ease forwards;
    }

    @keyframes slideIn {
      from {
        opacity: 0;
        transform: translateX(100px);
      }
    }

    @keyframes slideOut {
      to {
        opacity: 0;
        transform: translateX(100px);
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>🎯 Hit Board</h1>
      <div class="admin-bar">
        <span id="adminStatus">{{ADMIN_STATUS}}</span>
        {{ADMIN_BUTTONS}}
      </div>
    </header>

    <section class="panel stats">
      <div class="stat"><span class="label">Total hits</span><span class="value" id="totalHits">{{TOTAL_HITS}}</span></div>
      <div class="stat"><span class="label">Average rating</span><span class="value" id="avgRating">{{AVG_RATING}}</span></div>
      <div class="stat"><span class="label">Most common</span><span class="value" id="commonType">{{COMMON_TYPE}}</span></div>
    </section>

    <section class="submit-card">
      <h2>Report a hit</h2>
      <form id="hitForm" method="post" action="/hits" class="stack">
        <label>Reason <input id="hitReason" name="reason" required maxlength="200" /></label>
        <label>Type <select id="hitType" name="type">{{TYPE_OPTIONS}}</select></label>
        <label>Description <textarea id="hitDescription" name="description" rows="3"></textarea></label>
        <button class="primary-btn" type="submit">Submit hit</button>
      </form>
    </section>

    <section class="hits-list" id="hitsList">
      {{HITS}}
    </section>
  </main>

  {{MODAL}}

  <div class="toasts">{{TOASTS}}</div>

  <script>
    document.querySelectorAll('.toast').forEach((toast) => {
      setTimeout(() => {
        toast.classList.add('leaving');
        setTimeout(() => toast.remove(), 300);
      }, 3000);
    });
    document.addEventListener('keydown', (e) => {
      if (e.key === 'Escape' && document.querySelector('.modal.open')) {
        window.location.href = '/board';
      }
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HitRow;
    use crate::stats::build_stats;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap()
    }

    fn hit(kind: &str, ratings: Vec<u8>) -> Hit {
        Hit::from_row(
            HitRow {
                id: 42,
                reason: "<b>spilled</b> coffee".to_string(),
                kind: kind.to_string(),
                description: None,
                created_at: now() - Duration::hours(3),
            },
            ratings,
        )
    }

    fn filled_count(html: &str) -> usize {
        html.matches("star filled").count()
    }

    #[test]
    fn stars_fill_up_to_the_rounded_average() {
        assert_eq!(filled_count(&render_stars(1, 0.0)), 0);
        assert_eq!(filled_count(&render_stars(1, 2.4)), 2);
        assert_eq!(filled_count(&render_stars(1, 2.5)), 3);
        assert_eq!(filled_count(&render_stars(1, 3.0)), 3);
        assert_eq!(filled_count(&render_stars(1, 5.0)), 5);
    }

    #[test]
    fn every_star_submits_its_own_value() {
        let html = render_stars(7, 4.6);
        assert!(html.contains(r#"action="/hits/7/rate""#));
        for i in 1..=5 {
            assert!(html.contains(&format!(r#"value="{i}""#)));
        }
    }

    #[test]
    fn time_ago_buckets() {
        let now = now();
        assert_eq!(time_ago(now - Duration::minutes(30), now), "Just now");
        assert_eq!(time_ago(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::hours(30), now), "1 day ago");
        assert_eq!(time_ago(now - Duration::days(3), now), "3 days ago");
        assert_eq!(time_ago(now + Duration::hours(2), now), "Just now");
    }

    #[test]
    fn card_escapes_text_and_labels_counts() {
        let html = render_hit_card(&hit("slap", vec![]), false, now());
        assert!(html.contains("&lt;b&gt;spilled&lt;/b&gt; coffee"));
        assert!(html.contains("No ratings yet"));
        assert!(html.contains("Classic Slap"));
        assert!(html.contains("3 hours ago"));

        let rated = render_hit_card(&hit("mystery", vec![4, 2]), false, now());
        assert!(rated.contains("2 ratings • 3.0"));
        assert!(rated.contains("Other"));
    }

    #[test]
    fn admin_controls_only_for_admins() {
        let hit = hit("poke", vec![]);
        assert!(!render_hit_card(&hit, false, now()).contains("/hits/42/delete"));
        let admin = render_hit_card(&hit, true, now());
        assert!(admin.contains("/hits/42/delete"));
        assert!(admin.contains(r#"<form method="post" action="/hits/42/edit">"#));
    }

    #[test]
    fn empty_board_shows_empty_state() {
        assert!(render_hits(&[], false, now()).contains("No hits yet!"));
    }

    #[test]
    fn page_is_filled_in_one_pass() {
        let mut sneaky = hit("poke", vec![5]);
        sneaky.reason = "{{MODAL}}".to_string();
        let hits = vec![sneaky];
        let stats = build_stats(&hits);
        let notices = vec![Notice::error("Wrong passcode.")];
        let html = render_index(&PageView {
            hits: &hits,
            gate: AdminGate::Guest,
            stats: &stats,
            notices: &notices,
            modal: Modal::Login,
            now: now(),
        });

        assert!(html.contains("🎯 {{MODAL}}"));
        assert!(html.contains("Admin login"));
        assert!(html.contains("Wrong passcode."));
        assert!(html.contains(r#"<span class="value" id="avgRating">5.0</span>"#));
        assert!(!html.contains("{{HITS}}"));
    }

    #[test]
    fn edit_modal_is_prefilled() {
        let mut hit = hit("pillow", vec![]);
        hit.description = Some("soft".to_string());
        let html = render_modal(&Modal::Edit(&hit), true);
        assert!(html.contains(r#"<option value="pillow" selected>"#));
        assert!(html.contains(">soft</textarea>"));
    }
}
