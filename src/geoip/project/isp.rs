use crate::geoip::project::Projection;
use crate::geoip::records::IspRecord;
use crate::geoip::schema::SchemaFamily;
use crate::variables::VariableSink;

impl Projection for IspRecord {
    const FAMILY: SchemaFamily = SchemaFamily::Isp;

    fn project(&self, sink: &mut VariableSink) {
        sink.set("autonomous_system_number", self.autonomous_system_number);
        sink.set(
            "autonomous_system_organization",
            &self.autonomous_system_organization,
        );
        sink.set("isp", &self.isp);
        sink.set("mobile_country_code", &self.mobile_country_code);
        sink.set("mobile_network_code", &self.mobile_network_code);
        sink.set("organization", &self.organization);
    }
}
