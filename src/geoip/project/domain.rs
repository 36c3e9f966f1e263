use crate::geoip::project::Projection;
use crate::geoip::records::DomainRecord;
use crate::geoip::schema::SchemaFamily;
use crate::variables::VariableSink;

impl Projection for DomainRecord {
    const FAMILY: SchemaFamily = SchemaFamily::Domain;

    fn project(&self, sink: &mut VariableSink) {
        sink.set("domain", &self.domain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_domain() {
        let mut sink = VariableSink::new();
        DomainRecord::default().project(&mut sink);
        assert_eq!(sink.get_str("domain"), Some(""));

        DomainRecord {
            domain: "verizon.net".into(),
        }
        .project(&mut sink);
        assert_eq!(sink.get_str("domain"), Some("verizon.net"));
    }
}
