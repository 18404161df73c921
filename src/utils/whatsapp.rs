/// Builders for outbound WhatsApp deep links. The service only constructs
/// these and hands them to the client to open; it never fetches them.

/// Free-text chat handoff: `wa.me` link with the visitor's message.
pub fn chat_link(phone: &str, text: &str) -> String {
    format!("https://wa.me/{}?text={}", phone, urlencoding::encode(text))
}

/// Post-payment contact link with the order id prefilled, matching the
/// success page's "Contact Us" button.
pub fn order_contact_link(phone: &str, order_number: &str) -> String {
    let message = format!(
        "Dear Techrealm, this is my order ID: {}. Let's start with the website development!",
        order_number
    );
    format!(
        "https://api.whatsapp.com/send/?phone={}&text={}&type=phone_number&app_absent=0",
        phone,
        urlencoding::encode(&message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_link_url_encodes_the_text() {
        let url = chat_link("+971585775935", "Hello there & good day");
        assert!(url.starts_with("https://wa.me/+971585775935?text="));
        assert!(url.contains("Hello%20there%20%26%20good%20day"));
    }

    #[test]
    fn order_link_carries_the_order_number() {
        let url = order_contact_link("923461115757", "A1B2C3");
        assert!(url.contains("phone=923461115757"));
        assert!(url.contains("A1B2C3"));
        assert!(url.contains("type=phone_number"));
    }
}
