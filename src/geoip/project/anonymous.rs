use crate::geoip::project::Projection;
use crate::geoip::records::AnonymousIpRecord;
use crate::geoip::schema::SchemaFamily;
use crate::variables::VariableSink;

impl Projection for AnonymousIpRecord {
    const FAMILY: SchemaFamily = SchemaFamily::Anonymous;

    fn project(&self, sink: &mut VariableSink) {
        sink.set("is_anonymous", self.is_anonymous);
        sink.set("is_anonymous_vpn", self.is_anonymous_vpn);
        sink.set("is_hosting_provider", self.is_hosting_provider);
        sink.set("is_public_proxy", self.is_public_proxy);
        sink.set("is_residential_proxy", self.is_residential_proxy);
        sink.set("is_tor_exit_node", self.is_tor_exit_node);
    }
}
