//! Server-rendered HTML pages.
//!
//! Pages are assembled by plain functions around one shared layout. All
//! interpolated user data goes through [`escape`]; values that come from
//! closed enums (statuses, blood groups) are their fixed `as_str` forms and
//! are interpolated directly.

use hemobank_core::{
  blood::BloodGroup,
  donation::Donation,
  inventory::BloodStock,
  request::BloodRequest,
  store::{LogView, PendingDonation, PendingRequest},
  user::User,
};

use crate::handlers::admin::DashboardStats;

/// Minimal HTML entity escaping for user-supplied text.
pub fn escape(s: &str) -> String {
  s.chars()
    .map(|c| match c {
      '&' => "&amp;".to_string(),
      '<' => "&lt;".to_string(),
      '>' => "&gt;".to_string(),
      '"' => "&quot;".to_string(),
      '\'' => "&#39;".to_string(),
      other => other.to_string(),
    })
    .collect()
}

fn layout(title: &str, user: Option<&User>, body: &str) -> String {
  let nav = match user {
    Some(u) => format!(
      "<nav><span>{} ({})</span> \
       <a href=\"/{}/dashboard\">Dashboard</a> \
       <a href=\"/auth/logout\">Log out</a></nav>",
      escape(&u.name),
      u.role,
      u.role.as_str(),
    ),
    None => "<nav><a href=\"/auth/login\">Log in</a> \
             <a href=\"/auth/register\">Register</a></nav>"
      .to_string(),
  };

  format!(
    "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
     <meta charset=\"utf-8\">\n<title>{title} — Hemobank</title>\n</head>\n\
     <body>\n<header><h1>Hemobank</h1>{nav}</header>\n\
     <main>\n{body}\n</main>\n</body>\n</html>\n"
  )
}

fn flash_block(success: Option<&str>, error: Option<&str>) -> String {
  let mut out = String::new();
  if let Some(msg) = success {
    out.push_str(&format!("<p class=\"flash success\">{}</p>", escape(msg)));
  }
  if let Some(msg) = error {
    out.push_str(&format!("<p class=\"flash error\">{}</p>", escape(msg)));
  }
  out
}

fn group_options() -> String {
  BloodGroup::ALL
    .iter()
    .map(|g| format!("<option value=\"{g}\">{g}</option>"))
    .collect()
}

// ─── Public pages ────────────────────────────────────────────────────────────

pub fn home() -> String {
  layout(
    "Welcome",
    None,
    "<h2>Coordinating blood donation</h2>\
     <p>Donors offer units, recipients request them, and the blood bank \
     keeps the ledger straight.</p>\
     <p><a href=\"/auth/register\">Register</a> or \
     <a href=\"/auth/login\">log in</a> to continue.</p>",
  )
}

pub fn register_form(error: Option<&str>) -> String {
  let body = format!(
    "<h2>Register</h2>{}\
     <form method=\"post\" action=\"/auth/register\">\
     <label>Name <input name=\"name\" required></label><br>\
     <label>Email <input name=\"email\" type=\"email\" required></label><br>\
     <label>Password <input name=\"password\" type=\"password\" required></label><br>\
     <label>Role <select name=\"role\">\
     <option value=\"donor\">Donor</option>\
     <option value=\"recipient\">Recipient</option>\
     </select></label><br>\
     <label>Blood group <select name=\"blood_group\">{}</select></label><br>\
     <label>Phone <input name=\"phone\"></label><br>\
     <label>Address <input name=\"address\"></label><br>\
     <label>Age <input name=\"age\" type=\"number\" min=\"0\"></label><br>\
     <button type=\"submit\">Register</button>\
     </form>",
    flash_block(None, error),
    group_options(),
  );
  layout("Register", None, &body)
}

pub fn login_form(error: Option<&str>) -> String {
  let body = format!(
    "<h2>Log in</h2>{}\
     <form method=\"post\" action=\"/auth/login\">\
     <label>Email <input name=\"email\" type=\"email\" required></label><br>\
     <label>Password <input name=\"password\" type=\"password\" required></label><br>\
     <button type=\"submit\">Log in</button>\
     </form>",
    flash_block(None, error),
  );
  layout("Log in", None, &body)
}

pub fn access_denied() -> String {
  layout("Access denied", None, "<h2>Access denied</h2>")
}

pub fn error_page(message: &str) -> String {
  layout(
    "Error",
    None,
    &format!("<h2>Error</h2><p>{}</p>", escape(message)),
  )
}

// ─── Donor pages ─────────────────────────────────────────────────────────────

pub fn donor_dashboard(user: &User, donations: &[Donation], error: Option<&str>) -> String {
  let rows: String = donations
    .iter()
    .map(|d| {
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        d.blood_group,
        d.units,
        d.status,
        escape(d.location.as_deref().unwrap_or("-")),
        d.created_at.format("%Y-%m-%d"),
      )
    })
    .collect();

  let body = format!(
    "<h2>Your donations</h2>{}\
     <p><a href=\"/donor/donation-form\">Donate blood</a></p>\
     <table><tr><th>Group</th><th>Units</th><th>Status</th>\
     <th>Location</th><th>Submitted</th></tr>{rows}</table>",
    flash_block(None, error),
  );
  layout("Donor dashboard", Some(user), &body)
}

pub fn donation_form(user: &User, error: Option<&str>) -> String {
  let body = format!(
    "<h2>Donate blood</h2>{}\
     <p>Your blood group: <strong>{}</strong></p>\
     <form method=\"post\" action=\"/donor/donate\">\
     <label>Units <input name=\"units\" type=\"number\" min=\"1\" required></label><br>\
     <label>Location <input name=\"location\"></label><br>\
     <button type=\"submit\">Submit donation</button>\
     </form>",
    flash_block(None, error),
    user.blood_group,
  );
  layout("Donate", Some(user), &body)
}

// ─── Recipient pages ─────────────────────────────────────────────────────────

pub fn recipient_dashboard(
  user: &User,
  requests: &[BloodRequest],
  error: Option<&str>,
) -> String {
  let rows: String = requests
    .iter()
    .map(|r| {
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
         <td>{}</td></tr>",
        r.blood_group,
        r.units,
        r.urgency,
        r.status,
        escape(r.hospital.as_deref().unwrap_or("-")),
        r.created_at.format("%Y-%m-%d"),
      )
    })
    .collect();

  let body = format!(
    "<h2>Your requests</h2>{}\
     <p><a href=\"/recipient/request-form\">Request blood</a></p>\
     <table><tr><th>Group</th><th>Units</th><th>Urgency</th><th>Status</th>\
     <th>Hospital</th><th>Submitted</th></tr>{rows}</table>",
    flash_block(None, error),
  );
  layout("Recipient dashboard", Some(user), &body)
}

pub fn request_form(user: &User, error: Option<&str>) -> String {
  let body = format!(
    "<h2>Request blood</h2>{}\
     <form method=\"post\" action=\"/recipient/request\">\
     <label>Blood group <select name=\"blood_group\">{}</select></label><br>\
     <label>Units <input name=\"units\" type=\"number\" min=\"1\" required></label><br>\
     <label>Urgency <select name=\"urgency\">\
     <option value=\"low\">Low</option>\
     <option value=\"medium\" selected>Medium</option>\
     <option value=\"high\">High</option>\
     </select></label><br>\
     <label>Location <input name=\"location\"></label><br>\
     <label>Hospital <input name=\"hospital\"></label><br>\
     <label>Required by <input name=\"required_by\" type=\"date\"></label><br>\
     <button type=\"submit\">Submit request</button>\
     </form>",
    flash_block(None, error),
    group_options(),
  );
  layout("Request blood", Some(user), &body)
}

// ─── Admin pages ─────────────────────────────────────────────────────────────

pub fn admin_dashboard(
  user: &User,
  stats: &DashboardStats,
  donations: &[PendingDonation],
  requests: &[PendingRequest],
  success: Option<&str>,
  error: Option<&str>,
) -> String {
  let donor_groups: String = stats
    .donors_by_group
    .iter()
    .map(|g| format!("<li>{}: {}</li>", g.blood_group, g.count))
    .collect();
  let recipient_groups: String = stats
    .recipients_by_group
    .iter()
    .map(|g| format!("<li>{}: {}</li>", g.blood_group, g.count))
    .collect();

  let donation_rows: String = donations
    .iter()
    .map(|p| {
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
         <td><form method=\"post\" action=\"/admin/approve-donation/{id}\">\
         <button>Approve</button></form>\
         <form method=\"post\" action=\"/admin/reject-donation/{id}\">\
         <button>Reject</button></form></td></tr>",
        escape(&p.donor_name),
        p.donation.blood_group,
        p.donation.units,
        p.donation.created_at.format("%Y-%m-%d"),
        id = p.donation.donation_id,
      )
    })
    .collect();

  let request_rows: String = requests
    .iter()
    .map(|p| {
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
         <td><form method=\"post\" action=\"/admin/approve-request/{id}\">\
         <button>Approve</button></form>\
         <form method=\"post\" action=\"/admin/reject-request/{id}\">\
         <button>Reject</button></form></td></tr>",
        escape(&p.recipient_name),
        p.request.blood_group,
        p.request.units,
        p.request.urgency,
        p.request.created_at.format("%Y-%m-%d"),
        id = p.request.request_id,
      )
    })
    .collect();

  let body = format!(
    "<h2>Admin dashboard</h2>{flash}\
     <p><a href=\"/admin/manage-inventory\">Manage inventory</a></p>\
     <ul>\
     <li>Donors: {donors}</li>\
     <li>Recipients: {recipients}</li>\
     <li>Pending donations: {pending_donations}</li>\
     <li>Pending requests: {pending_requests}</li>\
     </ul>\
     <h3>Donors by group</h3><ul>{donor_groups}</ul>\
     <h3>Recipients by group</h3><ul>{recipient_groups}</ul>\
     <h3>Pending donations</h3>\
     <table><tr><th>Donor</th><th>Group</th><th>Units</th><th>Submitted</th>\
     <th></th></tr>{donation_rows}</table>\
     <h3>Pending requests</h3>\
     <table><tr><th>Recipient</th><th>Group</th><th>Units</th><th>Urgency</th>\
     <th>Submitted</th><th></th></tr>{request_rows}</table>",
    flash = flash_block(success, error),
    donors = stats.donors,
    recipients = stats.recipients,
    pending_donations = stats.pending_donations,
    pending_requests = stats.pending_requests,
  );
  layout("Admin dashboard", Some(user), &body)
}

pub fn manage_inventory(
  user: &User,
  stock: &[BloodStock],
  logs: &[LogView],
  success: Option<&str>,
  error: Option<&str>,
) -> String {
  let stock_rows: String = stock
    .iter()
    .map(|s| {
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
        s.blood_group,
        s.units,
        s.last_updated.format("%Y-%m-%d %H:%M"),
      )
    })
    .collect();

  let log_rows: String = logs
    .iter()
    .map(|l| {
      format!(
        "<tr><td>{}</td><td>{}</td><td>{:+}</td><td>{}</td><td>{}</td>\
         <td>{}</td></tr>",
        l.entry.recorded_at.format("%Y-%m-%d %H:%M"),
        l.entry.blood_group,
        l.entry.delta,
        l.entry.kind,
        escape(l.entry.description.as_deref().unwrap_or("-")),
        escape(l.user_name.as_deref().unwrap_or("-")),
      )
    })
    .collect();

  let body = format!(
    "<h2>Inventory</h2>{}\
     <table><tr><th>Group</th><th>Units</th><th>Updated</th></tr>\
     {stock_rows}</table>\
     <h3>Adjust</h3>\
     <form method=\"post\" action=\"/admin/update-inventory\">\
     <label>Blood group <select name=\"blood_group\">{}</select></label><br>\
     <label>Units <input name=\"units\" type=\"number\" min=\"0\" required></label><br>\
     <label>Action <select name=\"action\">\
     <option value=\"add\">Add</option>\
     <option value=\"subtract\">Subtract</option>\
     <option value=\"set\">Set</option>\
     </select></label><br>\
     <label>Description <input name=\"description\"></label><br>\
     <button type=\"submit\">Apply</button>\
     </form>\
     <h3>Recent activity</h3>\
     <table><tr><th>When</th><th>Group</th><th>Delta</th><th>Kind</th>\
     <th>Description</th><th>By</th></tr>{log_rows}</table>",
    flash_block(success, error),
    group_options(),
  );
  layout("Manage inventory", Some(user), &body)
}
