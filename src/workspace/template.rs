/// Body written to newly created template files
pub const DEFAULT_TEMPLATE: &str = r##"<mjml>
  <mj-body>
    <mj-section>
      <mj-column>

        <mj-image width="100px" src="https://mjml.io/assets/img/logo-small.png"></mj-image>

        <mj-divider border-color="#F45E43"></mj-divider>

        <mj-text font-size="20px" color="#F45E43" font-family="helvetica">Hello World</mj-text>

      </mj-column>
    </mj-section>
  </mj-body>
</mjml>
"##;

/// Largest template accepted by import
pub const MAX_TEMPLATE_SIZE: usize = 1_048_576;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_is_complete() {
        assert!(DEFAULT_TEMPLATE.starts_with("<mjml>\n"));
        assert!(DEFAULT_TEMPLATE.ends_with("</mjml>\n"));
        assert!(DEFAULT_TEMPLATE.contains(r##"<mj-divider border-color="#F45E43"></mj-divider>"##));
        assert!(DEFAULT_TEMPLATE.len() < MAX_TEMPLATE_SIZE);
    }
}
