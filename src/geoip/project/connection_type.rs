use crate::geoip::project::Projection;
use crate::geoip::records::ConnectionTypeRecord;
use crate::geoip::schema::SchemaFamily;
use crate::variables::VariableSink;

impl Projection for ConnectionTypeRecord {
    const FAMILY: SchemaFamily = SchemaFamily::ConnectionType;

    fn project(&self, sink: &mut VariableSink) {
        sink.set("connection_type", &self.connection_type);
    }
}
