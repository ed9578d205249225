//! The order-confirmation email.

use std::fmt::Write as _;

use admit_core::{
  event::{Event, TicketCategory},
  notify::Message,
  order::Order,
};

/// One rendered ticket to embed in the confirmation.
pub struct TicketImage<'a> {
  pub sequence: u32,
  /// `data:image/png;base64,...`
  pub data_url: &'a str,
}

/// Everything the confirmation mentions.
pub struct Confirmation<'a> {
  pub to_email: &'a str,
  pub to_name:  &'a str,
  pub order:    &'a Order,
  pub event:    &'a Event,
  pub category: &'a TicketCategory,
  pub tickets:  Vec<TicketImage<'a>>,
}

/// `4900, "USD"` → `"49.00 USD"`.
pub fn format_amount(minor: i64, currency: &str) -> String {
  let sign = if minor < 0 { "-" } else { "" };
  let abs = minor.unsigned_abs();
  format!("{sign}{}.{:02} {currency}", abs / 100, abs % 100)
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

pub fn confirmation_message(c: &Confirmation<'_>) -> Message {
  let total = format_amount(c.order.total_amount, &c.order.currency);
  let when = c.event.starts_at.format("%A %-d %B %Y, %H:%M UTC");
  let venue = c.event.venue.as_deref().unwrap_or("venue to be announced");
  let subject = format!("Your tickets for {}", c.event.name);

  let mut text = format!(
    "Hi {name},\n\n\
     Thanks for your order. Here is your summary:\n\n\
     Event:    {event}\n\
     When:     {when}\n\
     Where:    {venue}\n\
     Tickets:  {qty} x {category}\n\
     Total:    {total}\n\
     Order:    {order_id}\n\n",
    name = c.to_name,
    event = c.event.name,
    qty = c.order.quantity,
    category = c.category.name,
    order_id = c.order.order_id,
  );
  if c.tickets.is_empty() {
    text.push_str("Your tickets are being prepared and will follow in a separate email.\n");
  } else {
    text.push_str("Your QR tickets are attached in the HTML version of this email.\n");
  }

  let mut html = format!(
    "<!DOCTYPE html>\n<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\n\
     <h2>Your tickets for {event}</h2>\n\
     <p>Hi {name}, thanks for your order.</p>\n\
     <table>\n\
     <tr><td>When</td><td>{when}</td></tr>\n\
     <tr><td>Where</td><td>{venue}</td></tr>\n\
     <tr><td>Tickets</td><td>{qty} &times; {category}</td></tr>\n\
     <tr><td>Total</td><td>{total}</td></tr>\n\
     <tr><td>Order</td><td>{order_id}</td></tr>\n\
     </table>\n",
    event = escape_html(&c.event.name),
    name = escape_html(c.to_name),
    venue = escape_html(venue),
    qty = c.order.quantity,
    category = escape_html(&c.category.name),
    order_id = c.order.order_id,
  );
  for ticket in &c.tickets {
    let _ = write!(
      html,
      "<div style=\"margin: 24px 0;\"><p>Ticket {seq} of {qty}</p>\
       <img src=\"{src}\" alt=\"Ticket {seq} QR code\" width=\"240\" height=\"240\"></div>\n",
      seq = ticket.sequence,
      qty = c.order.quantity,
      src = ticket.data_url,
    );
  }
  html.push_str("</body></html>\n");

  Message {
    to: c.to_email.to_owned(),
    to_name: Some(c.to_name.to_owned()).filter(|n| !n.is_empty()),
    subject,
    text,
    html,
  }
}
